//! Facility colours, shared by the 2D layers and the embedded 3D scene.

use formats::{ConveyorType, FlowKind};

/// `0xRRGGBB`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub fn to_hex_string(self) -> String {
        format!("#{:06x}", self.0 & 0x00ff_ffff)
    }

    pub fn to_rgb_f32(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b]
    }
}

pub const BUILDING: Color = Color(0xc6cdd8);
pub const HALO: Color = Color(0x253045);
pub const FLOOR: Color = Color(0x2b3340);
pub const BAY: Color = Color(0x00d08a);
pub const ANCHOR: Color = Color(0x00d08a);

pub fn conveyor(ty: ConveyorType) -> Color {
    match ty {
        ConveyorType::Mechanical => Color(0x14b8a6),
        ConveyorType::Manual => Color(0xf59e0b),
    }
}

pub fn dock(kind: FlowKind) -> Color {
    match kind {
        FlowKind::Inbound => Color(0x2563eb),
        FlowKind::Outbound => Color(0xb91c1c),
    }
}

pub fn path(kind: FlowKind) -> Color {
    match kind {
        FlowKind::Inbound => Color(0x60a5fa),
        FlowKind::Outbound => Color(0xfca5a5),
    }
}

pub fn vehicle(kind: FlowKind) -> Color {
    match kind {
        FlowKind::Inbound => Color(0x38bdf8),
        FlowKind::Outbound => Color(0xf43f5e),
    }
}

#[cfg(test)]
mod tests {
    use super::{BAY, Color};

    #[test]
    fn hex_string_is_zero_padded() {
        assert_eq!(BAY.to_hex_string(), "#00d08a");
        assert_eq!(Color(0x0000ff).to_rgb_f32(), [0.0, 0.0, 1.0]);
    }
}
