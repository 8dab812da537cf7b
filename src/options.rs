//! Closed option sets for every select-style intake field.
//!
//! Each set is a plain enum carrying its wire value (what the backend stores)
//! and its display label (what the form shows). Values outside a set fail
//! intake validation; the response browser keeps raw strings and uses these
//! sets only to look up labels.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The only country the intake form accepts for `livingCountry`.
pub const SUPPORTED_COUNTRY: &str = "Germany";

/// Raised when a wire value is not part of its closed option set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption {
    pub set: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.value, self.set)
    }
}

impl std::error::Error for UnknownOption {}

/// Common interface over the generated option enums.
pub trait ClosedOption: Sized + Copy + 'static {
    /// Human-readable name of the set, used in error messages.
    const SET_NAME: &'static str;
    /// Every variant, in display order.
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;
    fn label(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|option| option.as_str() == value)
    }
}

/// Returns the display label for a stored value, or the value itself when it
/// is not part of the set.
pub fn label_or_verbatim<T: ClosedOption>(raw: &str) -> String {
    T::parse(raw)
        .map(|option| option.label().to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Declares a closed option enum with wire values and labels.
macro_rules! closed_options {
    (
        $(#[$meta:meta])*
        $name:ident, $set:literal {
            $( $variant:ident => ($value:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant ),+
        }

        impl ClosedOption for $name {
            const SET_NAME: &'static str = $set;
            const ALL: &'static [Self] = &[$( $name::$variant ),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $value ),+
                }
            }

            fn label(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as ClosedOption>::parse(s).ok_or_else(|| UnknownOption {
                    set: $set,
                    value: s.to_string(),
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

closed_options! {
    FamilyStatus, "family status" {
        Single => ("single", "Single"),
        Married => ("married", "Married"),
        Other => ("other", "Other"),
    }
}

closed_options! {
    HasKids, "kids answer" {
        Yes => ("yes", "Yes"),
        No => ("no", "No"),
    }
}

closed_options! {
    EmploymentStatus, "employment status" {
        SelfEmployed => ("self-employed", "Self-Employed"),
        Unemployed => ("unemployed", "Unemployed"),
        Employed => ("employed", "Employed"),
    }
}

closed_options! {
    HousingStatus, "housing status" {
        Owner => ("owner", "Owner"),
        Renting => ("renting", "Renting"),
        LivingWithParents => ("living-with-parents", "Living with Parents"),
    }
}

closed_options! {
    FinancialKnowledge, "financial knowledge level" {
        Naive => ("naive", "Naïve"),
        Beginner => ("beginner", "Beginner"),
        SomewhatConfident => ("somewhat-confident", "Somewhat Confident"),
        Confident => ("confident", "Confident"),
    }
}

closed_options! {
    RiskComfort, "risk comfort level" {
        Conservative => (
            "conservative",
            "Conservative: Low Risk (I prefer certainty and stability, even if returns are lower)"
        ),
        Balanced => (
            "balanced",
            "Balance: Middle Risk (I am able to bear with gradual ups and down)"
        ),
        Growth => (
            "growth",
            "Growth: High Risk (I can tolerate high volatility for greater returns)"
        ),
    }
}

closed_options! {
    MonthlyIncome, "monthly income range" {
        From500To1000 => ("500-1000", "€500 - €1,000"),
        From1000To2000 => ("1000-2000", "€1,000 - €2,000"),
        From2000To3000 => ("2000-3000", "€2,000 - €3,000"),
        From3000To4000 => ("3000-4000", "€3,000 - €4,000"),
        From4000To5000 => ("4000-5000", "€4,000 - €5,000"),
        From5000To6000 => ("5000-6000", "€5,000 - €6,000"),
        Above6000 => ("6000+", "€6,000+"),
    }
}

closed_options! {
    IncomeStability, "income stability" {
        Regular => ("regular", "Regular (Permanent Job)"),
        Stable => ("stable", "Stable"),
        Unstable => ("unstable", "Unstable/Variable"),
    }
}

closed_options! {
    GoalType, "goal type" {
        Travel => ("travel", "Travel / Holidays"),
        Marriage => ("marriage", "Marriage"),
        HomeFurnishing => ("home-furnishing", "Home Furnishing"),
        Education => ("education", "Education"),
        EmergencyFund => ("emergency-fund", "Emergency Fund"),
        Car => ("car", "Purchase a Car"),
        Investment => ("investment", "Investment"),
    }
}

closed_options! {
    GoalAmountRange, "goal amount range" {
        UpTo5000 => ("0-5000", "€0 - €5,000"),
        From5000To10000 => ("5000-10000", "€5,000 - €10,000"),
        From10000To25000 => ("10000-25000", "€10,000 - €25,000"),
        From25000To50000 => ("25000-50000", "€25,000 - €50,000"),
        Above50000 => ("50000+", "€50,000+"),
    }
}

closed_options! {
    TimeHorizon, "time horizon" {
        ShortTerm => ("short-term", "Short-Term (3 Months – 1 Year)"),
        MediumTerm => ("medium-term", "Medium Term (1 Year – 5 Years)"),
    }
}

closed_options! {
    FundingSource, "funding source" {
        MonthlySavings => ("monthly-savings", "Monthly Savings"),
        Combination => (
            "combination",
            "Combination (Monthly Savings + Already Saved, etc.)"
        ),
    }
}

closed_options! {
    GoalFlexibility, "goal flexibility" {
        Fixed => ("fixed", "Fixed (Time-based)"),
        SomewhatFlexible => ("somewhat-flexible", "Somewhat Flexible"),
        Flexible => ("flexible", "Flexible"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_round_trip_through_from_str() {
        for option in GoalType::ALL {
            assert_eq!(option.as_str().parse::<GoalType>().ok(), Some(*option));
        }
    }

    #[test]
    fn test_unknown_value_is_rejected() {
        let err = "yacht".parse::<GoalType>().unwrap_err();
        assert_eq!(err.value, "yacht");
        assert_eq!(err.to_string(), "'yacht' is not a valid goal type");
    }

    #[test]
    fn test_serde_uses_wire_value() {
        let json = serde_json::to_string(&HousingStatus::LivingWithParents).unwrap();
        assert_eq!(json, "\"living-with-parents\"");

        let parsed: MonthlyIncome = serde_json::from_str("\"6000+\"").unwrap();
        assert_eq!(parsed, MonthlyIncome::Above6000);

        assert!(serde_json::from_str::<RiskComfort>("\"reckless\"").is_err());
    }

    #[test]
    fn test_label_or_verbatim() {
        assert_eq!(label_or_verbatim::<GoalType>("car"), "Purchase a Car");
        assert_eq!(label_or_verbatim::<GoalType>("boat"), "boat");
    }

    #[test]
    fn test_set_sizes() {
        assert_eq!(FinancialKnowledge::ALL.len(), 4);
        assert_eq!(MonthlyIncome::ALL.len(), 7);
        assert_eq!(GoalType::ALL.len(), 7);
        assert_eq!(GoalAmountRange::ALL.len(), 5);
    }
}
