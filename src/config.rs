use std::{env, str::FromStr};

use fp::{matrix::Encoding, prime::ValidPrime};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::progress::{Sampler, DEFAULT_SAMPLE_SHIFT};

pub const SAMPLE_SHIFT_VAR: &str = "STEENROD_SAMPLE_SHIFT";
pub const BACKEND_VAR: &str = "STEENROD_BACKEND";

/// Tunables shared by every engine call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Check for cancellation and report progress every `2^sample_shift` rows. Must be less than
    /// `usize::BITS`; deserialization rejects larger values.
    #[serde(deserialize_with = "deserialize_sample_shift")]
    pub sample_shift: u32,
    /// Force an encoding instead of using [`Encoding::preferred`].
    pub encoding: Option<Encoding>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_shift: DEFAULT_SAMPLE_SHIFT,
            encoding: None,
        }
    }
}

fn deserialize_sample_shift<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let shift = u32::deserialize(deserializer)?;
    if shift < usize::BITS {
        Ok(shift)
    } else {
        Err(D::Error::custom(format!(
            "sample shift {shift} is out of range, it must be less than {}",
            usize::BITS
        )))
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    match env::var(name) {
        Ok(value) => match value.parse() {
            Ok(x) => Some(x),
            Err(_) => {
                tracing::warn!("Invalid value of {name} variable: {value}");
                None
            }
        },
        Err(env::VarError::NotUnicode(_)) => {
            tracing::warn!("Invalid value of {name} variable");
            None
        }
        Err(env::VarError::NotPresent) => None,
    }
}

impl Config {
    /// The defaults, overridden by `STEENROD_SAMPLE_SHIFT` and `STEENROD_BACKEND` when they are
    /// set to valid values.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(shift) = parse_var::<u32>(SAMPLE_SHIFT_VAR) {
            config = config.with_sample_shift(shift);
        }
        if let Some(encoding) = parse_var::<Encoding>(BACKEND_VAR) {
            config.encoding = Some(encoding);
        }
        config
    }

    /// Replace the sample shift, ignoring values so large that `2^shift` overflows.
    #[must_use]
    pub fn with_sample_shift(mut self, shift: u32) -> Self {
        if shift < usize::BITS {
            self.sample_shift = shift;
        } else {
            tracing::warn!(shift, "sample shift out of range, keeping {}", self.sample_shift);
        }
        self
    }

    /// The encoding to use for matrices over `p`. A configured encoding that cannot hold `p` is
    /// ignored with a warning.
    pub fn encoding_for(&self, p: ValidPrime) -> Encoding {
        match self.encoding {
            Some(encoding) if encoding.supports(p) => encoding,
            Some(encoding) => {
                tracing::warn!(%encoding, %p, "encoding does not support this prime");
                Encoding::preferred(p)
            }
            None => Encoding::preferred(p),
        }
    }

    pub fn sampler<'a>(&self) -> Sampler<'a> {
        Sampler::new(self.sample_shift)
    }
}
