//! ARN Subject Classification
//!
//! Pure classification of the acting identity from the ARN-like subject
//! string a log record carries. Three shapes are recognized, tried in order:
//!
//! 1. assumed role:   `arn:aws:sts::<account>:assumed-role/<name>`
//! 2. IAM user:       `arn:aws:iam::<account>:user/<name>`
//! 3. federated user: `arn:aws:sts::<account>:federated-user/<name>`
//!
//! First match wins. Anything else is a [`Error::Classification`] the caller
//! must handle; classification never produces an empty subject.

use crate::error::{Error, Result};
use crate::models::{Identity, Subject};
use regex::Regex;
use std::sync::OnceLock;

struct SubjectPatterns {
    assumed_role: Regex,
    iam_user: Regex,
    federated_user: Regex,
}

fn patterns() -> &'static SubjectPatterns {
    static PATTERNS: OnceLock<SubjectPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| SubjectPatterns {
        assumed_role: Regex::new(r"^arn:aws:sts::(\d*):assumed-role/(.*)$")
            .expect("invalid assumed-role pattern"),
        iam_user: Regex::new(r"^arn:aws:iam::(\d*):user/(.*)$")
            .expect("invalid iam-user pattern"),
        federated_user: Regex::new(r"^arn:aws:sts::(\d*):federated-user/(.*)$")
            .expect("invalid federated-user pattern"),
    })
}

/// Classify a subject string into a [`Subject`] and its canonical key.
///
/// The canonical key is kind-prefixed (`role:`, `user:`, `federated-user:`)
/// so that identically named subjects of different kinds never collide in
/// the report.
pub fn classify(subject: &str) -> Result<(Subject, String)> {
    let p = patterns();

    if let Some(caps) = p.assumed_role.captures(subject) {
        let identity = Identity {
            account: caps[1].to_string(),
            name: caps[2].to_string(),
        };
        let key = format!("role:{}", identity.name);
        return Ok((Subject::Role(identity), key));
    }

    if let Some(caps) = p.iam_user.captures(subject) {
        let identity = Identity {
            account: caps[1].to_string(),
            name: caps[2].to_string(),
        };
        let key = format!("user:{}", identity.name);
        return Ok((Subject::User(identity), key));
    }

    if let Some(caps) = p.federated_user.captures(subject) {
        let identity = Identity {
            account: caps[1].to_string(),
            name: caps[2].to_string(),
        };
        let key = format!("federated-user:{}", identity.name);
        return Ok((Subject::User(identity), key));
    }

    Err(Error::Classification {
        subject: subject.to_string(),
    })
}
