//! Field validation rules.
//!
//! Predicates are pure and total: they never panic and only answer yes or no.
//! The rule set is a value so deployments can pick the preset that matches
//! their data rather than relying on hard-coded thresholds.

use std::ops::RangeInclusive;

use crate::errors::ValidationError;

/// Registration field rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    /// Accepted email endings, checked with `ends_with`.
    pub email_suffixes: Vec<String>,
    /// Whether a phone number may start with `+`.
    pub allow_phone_plus: bool,
    pub min_password_len: usize,
    pub require_uppercase: bool,
    /// Inclusive bounds checked by the general age predicate.
    pub age_range: RangeInclusive<u32>,
    /// Extra lower bound applied to volunteers at registration.
    pub volunteer_min_age: u32,
}

impl ValidationRules {
    /// The richer rule set: `.com`/`.org`/`.edu`, `+` prefixed phones,
    /// uppercase plus digit passwords, ages 17 to 120.
    pub fn standard() -> Self {
        Self {
            email_suffixes: vec![".com".to_string(), ".org".to_string(), ".edu".to_string()],
            allow_phone_plus: true,
            min_password_len: 6,
            require_uppercase: true,
            age_range: 17..=120,
            volunteer_min_age: 16,
        }
    }

    /// The console rule set: `.com` only, digit-only phones, digit-only
    /// password requirement, ages 17 to 99.
    pub fn minimal() -> Self {
        Self {
            email_suffixes: vec![".com".to_string()],
            allow_phone_plus: false,
            min_password_len: 6,
            require_uppercase: false,
            age_range: 17..=99,
            volunteer_min_age: 16,
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "minimal" => Some(Self::minimal()),
            _ => None,
        }
    }

    /// Letters and spaces only, with at least one letter.
    pub fn valid_name(&self, name: &str) -> bool {
        let mut letters = name.chars().filter(|c| *c != ' ').peekable();
        letters.peek().is_some() && letters.all(char::is_alphabetic)
    }

    pub fn valid_email(&self, email: &str) -> bool {
        email.contains('@')
            && self
                .email_suffixes
                .iter()
                .any(|suffix| email.ends_with(suffix.as_str()))
    }

    pub fn valid_phone(&self, phone: &str) -> bool {
        let digits = match phone.strip_prefix('+') {
            Some(rest) if self.allow_phone_plus => rest,
            Some(_) => return false,
            None => phone,
        };
        is_digits(digits)
    }

    pub fn valid_password(&self, password: &str) -> bool {
        password.chars().count() >= self.min_password_len
            && (!self.require_uppercase || password.chars().any(char::is_uppercase))
            && password.chars().any(|c| c.is_ascii_digit())
    }

    pub fn valid_age(&self, age: &str) -> bool {
        self.parse_age(age).is_some()
    }

    /// Parse an age that passes [`valid_age`](Self::valid_age).
    pub fn parse_age(&self, age: &str) -> Option<u32> {
        if !is_digits(age) {
            return None;
        }
        age.parse::<u32>()
            .ok()
            .filter(|n| self.age_range.contains(n))
    }
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::standard()
    }
}

/// Minimum trimmed lengths for posted opportunities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityRules {
    /// When false, any field values are accepted.
    pub enforce: bool,
    pub min_title: usize,
    pub min_location: usize,
    pub min_date: usize,
    pub min_description: usize,
}

impl OpportunityRules {
    pub fn disabled() -> Self {
        Self {
            enforce: false,
            ..Self::default()
        }
    }

    /// Check fields in form order: title, location, date, description.
    pub fn check(
        &self,
        title: &str,
        description: &str,
        location: &str,
        date: &str,
    ) -> Result<(), ValidationError> {
        if !self.enforce {
            return Ok(());
        }
        if char_len(title) < self.min_title {
            return Err(ValidationError::TitleTooShort);
        }
        if char_len(location) < self.min_location {
            return Err(ValidationError::LocationTooShort);
        }
        if char_len(date) < self.min_date {
            return Err(ValidationError::DateTooShort);
        }
        if char_len(description) < self.min_description {
            return Err(ValidationError::DescriptionTooShort);
        }
        Ok(())
    }
}

impl Default for OpportunityRules {
    fn default() -> Self {
        Self {
            enforce: true,
            min_title: 3,
            min_location: 2,
            min_date: 4,
            min_description: 8,
        }
    }
}

/// Both rule sets the engine consults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rules {
    pub fields: ValidationRules,
    pub opportunities: OpportunityRules,
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn char_len(s: &str) -> usize {
    s.trim().chars().count()
}
