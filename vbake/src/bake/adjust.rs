use crate::config::TextureSettings;
use crate::math::*;

/// Brightness, then contrast around mid-gray, then a blend from white by `strength`.
/// RGB is clamped to [0, 1] after each of the first two steps. Alpha passes through.
pub fn adjust(color: Vec4, strength: f32, contrast: f32, brightness: f32) -> Vec4 {
    let channel = |c: f32| {
        let c = (c + brightness).clamp(0.0, 1.0);
        let c = ((c - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
        1.0 + (c - 1.0) * strength
    };
    Vec4::new(channel(color.x), channel(color.y), channel(color.z), color.w)
}

/// The three adjustment parameters taken together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAdjustment {
    pub strength: f32,
    pub contrast: f32,
    pub brightness: f32,
}

impl ColorAdjustment {
    pub const IDENTITY: ColorAdjustment = ColorAdjustment { strength: 1.0, contrast: 1.0, brightness: 0.0 };

    pub fn apply(&self, color: Vec4) -> Vec4 {
        adjust(color, self.strength, self.contrast, self.brightness)
    }
}

impl From<&TextureSettings> for ColorAdjustment {
    fn from(settings: &TextureSettings) -> Self {
        Self { strength: settings.strength, contrast: settings.contrast, brightness: settings.brightness }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_identity_is_noop_for_unit_colors() {
        let c = Vec4::new(0.2, 0.4, 0.8, 0.3);
        let result = ColorAdjustment::IDENTITY.apply(c);
        assert!((result - c).length() < 1e-6, "{result:?}");
    }

    #[rstest]
    #[case(0.0, Vec4::new(1.0, 1.0, 1.0, 0.5))]
    #[case(0.5, Vec4::new(0.6, 0.7, 0.8, 0.5))]
    #[case(1.0, Vec4::new(0.2, 0.4, 0.6, 0.5))]
    fn test_strength_blends_from_white(#[case] strength: f32, #[case] expected: Vec4) {
        let result = adjust(Vec4::new(0.2, 0.4, 0.6, 0.5), strength, 1.0, 0.0);
        assert!((result - expected).length() < 1e-6, "{result:?}");
    }

    #[test]
    fn test_brightness_clamps_before_contrast() {
        // 0.9 + 0.3 clamps to 1.0, contrast 2 keeps it at 1.0; 0.1 + 0.3 = 0.4 -> 0.3
        let result = adjust(Vec4::new(0.9, 0.1, 0.5, 1.0), 1.0, 2.0, 0.3);
        assert!((result - Vec4::new(1.0, 0.3, 1.0, 1.0)).length() < 1e-6, "{result:?}");
    }

    #[test]
    fn test_zero_contrast_is_mid_gray() {
        assert_eq!(adjust(Vec4::new(0.0, 0.3, 1.0, 0.0), 1.0, 0.0, 0.0), Vec4::new(0.5, 0.5, 0.5, 0.0));
    }

    #[test]
    fn test_alpha_untouched() {
        assert_eq!(adjust(Vec4::new(0.5, 0.5, 0.5, 0.0), 0.0, 3.0, 1.0).w, 0.0);
    }
}
