use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::error::{Error, Result};
use crate::raster::{ContainerFormat, SampleFormat, Samples};

/// Output sample width of a distance field, fixed once per invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Low,
    Mid,
    High,
}

impl Precision {
    pub const ALL: [Precision; 3] = [Precision::Low, Precision::Mid, Precision::High];

    pub fn sample_format(self) -> SampleFormat {
        match self {
            Precision::Low => SampleFormat::U8,
            Precision::Mid => SampleFormat::U16,
            Precision::High => SampleFormat::U32,
        }
    }

    /// Largest representable distance; also the "unreached" marker.
    pub fn max_value(self) -> u32 {
        self.sample_format().max_value()
    }

    pub fn default_beta_policy(self) -> BetaPolicy {
        match self {
            Precision::Low => BetaPolicy::Linear,
            Precision::Mid => BetaPolicy::Sqrt,
            Precision::High => BetaPolicy::Linear,
        }
    }

    pub fn default_container(self) -> ContainerFormat {
        match self {
            Precision::Low => ContainerFormat::Png,
            Precision::Mid | Precision::High => ContainerFormat::Tiff,
        }
    }

    pub fn default_extension(self) -> &'static str {
        match self.default_container() {
            ContainerFormat::Png => "png",
            _ => "tif",
        }
    }

    /// Pipeline cache key of the tier's kernel variant.
    pub(crate) fn variant(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Precision::Low => "low",
            Precision::Mid => "mid",
            Precision::High => "high",
        };
        write!(f, "{} ({}-bit)", name, self.sample_format().bits())
    }
}

/// Derives the kernel's step parameter from the pass-local iteration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetaPolicy {
    /// `2k + 1`
    Linear,
    /// `floor(sqrt(2k + 1))`
    Sqrt,
}

impl BetaPolicy {
    pub fn beta(self, iteration: u32) -> u32 {
        let step = 2 * iteration as u64 + 1;
        match self {
            BetaPolicy::Linear => step.min(u32::MAX as u64) as u32,
            BetaPolicy::Sqrt => (step as f64).sqrt() as u32,
        }
    }
}

/// 255 * 257 == 65535
pub fn scale_u8_to_u16(value: u8) -> u16 {
    value as u16 * 257
}

/// 255 * 16843009 == 4294967295
pub fn scale_u8_to_u32(value: u8) -> u32 {
    value as u32 * 16_843_009
}

/// 65535 * 65537 == 4294967295
pub fn scale_u16_to_u32(value: u16) -> u32 {
    value as u32 * 65_537
}

/// Expands `samples` to the dynamic range of `target`, as 32-bit words.
///
/// Narrowing is refused: the tier must be at least as wide as the input.
pub fn rescale(samples: &Samples, target: SampleFormat) -> Result<Vec<u32>> {
    let words = match (samples, target) {
        (Samples::U8(v), SampleFormat::U8) => v.iter().map(|&s| s as u32).collect(),
        (Samples::U8(v), SampleFormat::U16) => {
            v.iter().map(|&s| scale_u8_to_u16(s) as u32).collect()
        }
        (Samples::U8(v), SampleFormat::U32) => v.iter().map(|&s| scale_u8_to_u32(s)).collect(),
        (Samples::U16(v), SampleFormat::U16) => v.iter().map(|&s| s as u32).collect(),
        (Samples::U16(v), SampleFormat::U32) => v.iter().map(|&s| scale_u16_to_u32(s)).collect(),
        (Samples::U32(v), SampleFormat::U32) => v.clone(),
        (source, target) => {
            return Err(Error::Config(format!(
                "a {}-bit distance field cannot be computed from {}-bit input",
                target.bits(),
                source.sample_format().bits()
            )));
        }
    };

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_u8_to_u16_is_exact() {
        for v in 0..=u8::MAX {
            assert_eq!(scale_u8_to_u16(v) as u32, v as u32 * 257);
        }
        assert_eq!(scale_u8_to_u16(255), 65535);
    }

    #[test]
    fn test_scale_to_u32_hits_max() {
        assert_eq!(scale_u8_to_u32(0), 0);
        assert_eq!(scale_u8_to_u32(255), u32::MAX);
        assert_eq!(scale_u8_to_u32(1), 16_843_009);
        assert_eq!(scale_u16_to_u32(u16::MAX), u32::MAX);
        assert_eq!(scale_u16_to_u32(1), 65_537);
    }

    #[test]
    fn test_rescale_table() {
        let u8s = Samples::U8(vec![0, 1, 255]);
        assert_eq!(rescale(&u8s, SampleFormat::U8).unwrap(), vec![0, 1, 255]);
        assert_eq!(rescale(&u8s, SampleFormat::U16).unwrap(), vec![0, 257, 65535]);
        assert_eq!(
            rescale(&u8s, SampleFormat::U32).unwrap(),
            vec![0, 16_843_009, u32::MAX]
        );

        let u16s = Samples::U16(vec![0, 65535]);
        assert_eq!(rescale(&u16s, SampleFormat::U16).unwrap(), vec![0, 65535]);
        assert_eq!(rescale(&u16s, SampleFormat::U32).unwrap(), vec![0, u32::MAX]);
    }

    #[test]
    fn test_rescale_refuses_narrowing() {
        let u16s = Samples::U16(vec![0, 65535]);
        assert!(matches!(rescale(&u16s, SampleFormat::U8), Err(Error::Config(_))));

        let u32s = Samples::U32(vec![7]);
        assert!(matches!(rescale(&u32s, SampleFormat::U16), Err(Error::Config(_))));
    }

    #[test]
    fn test_beta_policies() {
        let linear: Vec<u32> = (0..5).map(|k| BetaPolicy::Linear.beta(k)).collect();
        assert_eq!(linear, vec![1, 3, 5, 7, 9]);

        let sqrt: Vec<u32> = (0..6).map(|k| BetaPolicy::Sqrt.beta(k)).collect();
        assert_eq!(sqrt, vec![1, 1, 2, 2, 3, 3]);

        assert_eq!(BetaPolicy::Linear.beta(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_beta_is_non_decreasing() {
        for policy in [BetaPolicy::Linear, BetaPolicy::Sqrt] {
            let mut previous = 0;
            for k in 0..5000 {
                let beta = policy.beta(k);
                assert!(beta >= previous, "{policy:?} decreased at {k}");
                previous = beta;
            }
        }
    }

    #[test]
    fn test_tier_defaults() {
        assert_eq!(Precision::Low.sample_format(), SampleFormat::U8);
        assert_eq!(Precision::Mid.max_value(), 65535);
        assert_eq!(Precision::High.max_value(), u32::MAX);
        assert_eq!(Precision::Low.default_extension(), "png");
        assert_eq!(Precision::High.default_extension(), "tif");
        for precision in Precision::ALL {
            assert!(precision.default_container().encodes(precision.sample_format()));
        }
    }
}
