use std::fmt;
use std::str::FromStr;

/// Optional parts of the machine.
///
/// Without any features the machine runs the minimal instruction set: no `INT`/`IRET` and no
/// interrupt check between cycles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// `INT`/`IRET`, interrupt mask and status registers, per-cycle interrupt check.
    pub interrupts: bool,
    /// Key presses from the terminal raise interrupt 1.
    pub keyboard: bool,
    /// A one second timer raises interrupt 0.
    pub timer: bool,
}

impl Features {
    /// Default set used by the command line.
    pub const DEFAULT_LIST: &'static str = "interrupts,keyboard";

    pub fn interrupts() -> Self {
        Features {
            interrupts: true,
            ..Self::default()
        }
    }
}

impl FromStr for Features {
    type Err = String;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let mut features = Self::default();
        for word in string.split(',').map(str::trim) {
            let value = match word {
                "" => continue,
                "interrupts" => &mut features.interrupts,
                "keyboard" => &mut features.keyboard,
                "timer" => &mut features.timer,
                _ => return Err(format!("Unknown feature '{word}'")),
            };
            if *value {
                return Err(format!("Cannot specify feature '{word}' twice"));
            }
            *value = true;
        }
        for (name, enabled) in [("keyboard", features.keyboard), ("timer", features.timer)] {
            if enabled && !features.interrupts {
                return Err(format!("Feature '{name}' requires 'interrupts'"));
            }
        }
        Ok(features)
    }
}

impl fmt::Display for Features {
    /// Enabled features as a comma list, in a fixed order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            ("interrupts", self.interrupts),
            ("keyboard", self.keyboard),
            ("timer", self.timer),
        ]
        .into_iter()
        .filter_map(|(name, enabled)| enabled.then_some(name));
        for (i, name) in names.enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lists() {
        assert_eq!("".parse::<Features>(), Ok(Features::default()));
        assert_eq!("interrupts".parse::<Features>(), Ok(Features::interrupts()));
        assert_eq!(
            "timer,interrupts,keyboard".parse::<Features>(),
            Ok(Features {
                interrupts: true,
                keyboard: true,
                timer: true,
            })
        );
    }

    #[test]
    fn rejects_bad_lists() {
        assert!("sound".parse::<Features>().is_err());
        assert!("interrupts,interrupts".parse::<Features>().is_err());
        assert!("keyboard".parse::<Features>().is_err());
        assert!("timer".parse::<Features>().is_err());
    }

    #[test]
    fn displays_as_list() {
        let features: Features = Features::DEFAULT_LIST.parse().unwrap();
        assert_eq!(features.to_string(), Features::DEFAULT_LIST);
        assert_eq!(Features::default().to_string(), "");
    }
}
