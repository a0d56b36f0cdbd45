use ansi_term::Style;
use std::fmt;

macro_rules! each_fmt_trait {
    ($mac:ident!)
    => {
        $mac!(std::fmt::Display);
        $mac!(std::fmt::Debug);
        $mac!(std::fmt::LowerExp);
    }
}

pub fn paint<T>(style: Style, value: T) -> Wrapper<T>
{ Wrapper { style, value } }

/// A wrapper for colorizing formatting traits like `Display`.
#[derive(Copy, Clone, PartialEq)]
pub struct Wrapper<T> {
    style: Style,
    value: T,
}

macro_rules! derive_fmt_impl {
    ($Trait:path)
    => {
        impl<T: $Trait> $Trait for Wrapper<T> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.style.prefix())?;
                <T as $Trait>::fmt(&self.value, f)?;
                write!(f, "{}", self.style.suffix())?;
                Ok(())
            }
        }
    };
}

each_fmt_trait!{derive_fmt_impl!}

#[cfg(test)]
mod tests {
    use super::*;
    use ansi_term::Colour;

    #[test]
    fn plain_style_is_invisible() {
        assert_eq!(paint(Style::new(), 1.5).to_string(), "1.5");
        assert_eq!(format!("{:e}", paint(Style::new(), 1500.0)), "1.5e3");
    }

    #[test]
    fn colour_wraps_the_value() {
        let s = paint(Colour::Red.bold(), "x").to_string();
        assert!(s.starts_with("\x1b["));
        assert!(s.contains('x'));
        assert!(s.ends_with("\x1b[0m"));
    }
}
