//! Name compliance rules for every resource kind.
//!
//! Names are checked locally before any provider call, so an invalid name
//! never reaches AWS.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ConfigError, NameError, NameRule, Result};
use crate::resource::ResourceKind;

const BUCKET_PATTERN: &str = "^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";
const ROLE_PATTERN: &str = "^[A-Za-z0-9_+=,.@-]{1,64}$";
const REPOSITORY_PATTERN: &str = "^[a-zA-Z0-9_-]+$";
const PROJECT_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9\-_]{1,254}$";
const PIPELINE_PATTERN: &str = r"^[A-Za-z0-9.@\-_]+$";
const STACK_PATTERN: &str = "^[a-zA-Z0-9_-]+$";
const IP_PATTERN: &str = r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$";

const BUCKET_RESERVED_PREFIXES: &[&str] = &["xn--", "sthree-"];
const BUCKET_RESERVED_SUFFIXES: &[&str] = &["-s3alias", "--ol-s3"];

/// Length of an AWS account id.
pub const ACCOUNT_ID_LEN: usize = 12;

/// Naming rules for one resource kind.
struct KindRules {
    min: usize,
    max: usize,
    pattern: &'static str,
}

impl KindRules {
    const fn for_kind(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Bucket => Self { min: 3, max: 63, pattern: BUCKET_PATTERN },
            ResourceKind::Role => Self { min: 3, max: 64, pattern: ROLE_PATTERN },
            ResourceKind::Repository => Self { min: 1, max: 100, pattern: REPOSITORY_PATTERN },
            ResourceKind::BuildProject => Self { min: 3, max: 255, pattern: PROJECT_PATTERN },
            ResourceKind::Pipeline => Self { min: 3, max: 100, pattern: PIPELINE_PATTERN },
            ResourceKind::Stack => Self { min: 1, max: 100, pattern: STACK_PATTERN },
        }
    }
}

static BUCKET_RE: LazyLock<Regex> = LazyLock::new(|| compile(BUCKET_PATTERN));
static ROLE_RE: LazyLock<Regex> = LazyLock::new(|| compile(ROLE_PATTERN));
static REPOSITORY_RE: LazyLock<Regex> = LazyLock::new(|| compile(REPOSITORY_PATTERN));
static PROJECT_RE: LazyLock<Regex> = LazyLock::new(|| compile(PROJECT_PATTERN));
static PIPELINE_RE: LazyLock<Regex> = LazyLock::new(|| compile(PIPELINE_PATTERN));
static STACK_RE: LazyLock<Regex> = LazyLock::new(|| compile(STACK_PATTERN));
static IP_RE: LazyLock<Regex> = LazyLock::new(|| compile(IP_PATTERN));

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    // Patterns are compile-time constants covered by the tests below.
    Regex::new(pattern).expect("naming pattern must compile")
}

fn regex_for(kind: ResourceKind) -> &'static Regex {
    match kind {
        ResourceKind::Bucket => &BUCKET_RE,
        ResourceKind::Role => &ROLE_RE,
        ResourceKind::Repository => &REPOSITORY_RE,
        ResourceKind::BuildProject => &PROJECT_RE,
        ResourceKind::Pipeline => &PIPELINE_RE,
        ResourceKind::Stack => &STACK_RE,
    }
}

/// Validates a resource name against the rules of its kind.
///
/// An empty name is reported as [`ConfigError::MissingName`]; any other
/// violation as a [`NameError`] carrying the first rule that failed.
///
/// # Errors
///
/// Returns an error if the name is empty or breaks a rule.
pub fn validate_name(kind: ResourceKind, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ConfigError::MissingName { kind }.into());
    }

    check_rules(kind, name).map_err(|rule| {
        NameError::Invalid {
            kind,
            name: name.to_string(),
            rule,
        }
        .into()
    })
}

fn check_rules(kind: ResourceKind, name: &str) -> std::result::Result<(), NameRule> {
    let rules = KindRules::for_kind(kind);

    if name.len() < rules.min || name.len() > rules.max {
        return Err(NameRule::Length {
            min: rules.min,
            max: rules.max,
        });
    }

    if kind == ResourceKind::Bucket {
        check_bucket_specifics(name)?;
    }

    if !regex_for(kind).is_match(name) {
        return Err(NameRule::Charset {
            pattern: rules.pattern,
        });
    }

    Ok(())
}

/// Bucket rules that must be reported before the charset check, which
/// would otherwise mask them.
fn check_bucket_specifics(name: &str) -> std::result::Result<(), NameRule> {
    if BUCKET_RESERVED_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return Err(NameRule::ReservedPrefix);
    }
    if BUCKET_RESERVED_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return Err(NameRule::ReservedSuffix);
    }
    if name.contains("..") {
        return Err(NameRule::AdjacentPeriods);
    }
    if IP_RE.is_match(name) {
        return Err(NameRule::IpAddress);
    }
    Ok(())
}

/// Returns true if the name satisfies the rules of its kind.
#[must_use]
pub fn is_compliant(kind: ResourceKind, name: &str) -> bool {
    validate_name(kind, name).is_ok()
}

/// Checks that a string is a valid AWS account id (exactly 12 digits).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidAccountId`] otherwise.
pub fn check_aws_account_id(account_id: &str) -> Result<()> {
    if account_id.len() == ACCOUNT_ID_LEN && account_id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ConfigError::InvalidAccountId {
            account_id: account_id.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AftctlError;

    fn rule_of(kind: ResourceKind, name: &str) -> NameRule {
        match validate_name(kind, name) {
            Err(AftctlError::Name(err)) => err.rule().clone(),
            other => panic!("expected a name error for {name:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_all_patterns_compile() {
        for kind in ResourceKind::ALL {
            let _ = regex_for(kind);
        }
        let _ = &*IP_RE;
    }

    #[test]
    fn test_empty_name_is_missing() {
        for kind in ResourceKind::ALL {
            assert!(matches!(
                validate_name(kind, ""),
                Err(AftctlError::Config(ConfigError::MissingName { kind: k })) if k == kind
            ));
        }
    }

    #[test]
    fn test_bucket_length_bounds() {
        assert_eq!(
            rule_of(ResourceKind::Bucket, "ab"),
            NameRule::Length { min: 3, max: 63 }
        );
        assert_eq!(
            rule_of(ResourceKind::Bucket, &"a".repeat(64)),
            NameRule::Length { min: 3, max: 63 }
        );
        assert!(is_compliant(ResourceKind::Bucket, "abc"));
        assert!(is_compliant(ResourceKind::Bucket, &"a".repeat(63)));
    }

    #[test]
    fn test_bucket_reserved_prefixes() {
        assert_eq!(rule_of(ResourceKind::Bucket, "xn--bucket"), NameRule::ReservedPrefix);
        assert_eq!(rule_of(ResourceKind::Bucket, "sthree-bucket"), NameRule::ReservedPrefix);
    }

    #[test]
    fn test_bucket_reserved_suffixes() {
        assert_eq!(rule_of(ResourceKind::Bucket, "bucket-s3alias"), NameRule::ReservedSuffix);
        assert_eq!(rule_of(ResourceKind::Bucket, "bucket--ol-s3"), NameRule::ReservedSuffix);
    }

    #[test]
    fn test_bucket_ip_and_periods() {
        assert_eq!(rule_of(ResourceKind::Bucket, "192.168.1.1"), NameRule::IpAddress);
        assert_eq!(rule_of(ResourceKind::Bucket, "bucket..name"), NameRule::AdjacentPeriods);
    }

    #[test]
    fn test_bucket_charset() {
        assert!(matches!(
            rule_of(ResourceKind::Bucket, "Invalid_Bucket"),
            NameRule::Charset { .. }
        ));
        assert!(matches!(
            rule_of(ResourceKind::Bucket, "-leading-hyphen"),
            NameRule::Charset { .. }
        ));
        assert!(is_compliant(ResourceKind::Bucket, "valid-bucket-name"));
        assert!(is_compliant(ResourceKind::Bucket, "123456789012-aft-deployment-codepipeline-artifact"));
    }

    #[test]
    fn test_role_rules() {
        assert!(is_compliant(ResourceKind::Role, "aft-deployment-codebuild-service-role"));
        assert!(is_compliant(ResourceKind::Role, "role+=,.@_-name"));
        assert_eq!(rule_of(ResourceKind::Role, "ab"), NameRule::Length { min: 3, max: 64 });
        assert!(matches!(rule_of(ResourceKind::Role, "role name"), NameRule::Charset { .. }));
        assert!(matches!(rule_of(ResourceKind::Role, "rôle"), NameRule::Charset { .. }));
    }

    #[test]
    fn test_repository_rules() {
        assert!(is_compliant(ResourceKind::Repository, "a"));
        assert!(is_compliant(ResourceKind::Repository, "aft-deployment"));
        assert_eq!(
            rule_of(ResourceKind::Repository, &"r".repeat(101)),
            NameRule::Length { min: 1, max: 100 }
        );
        assert!(matches!(
            rule_of(ResourceKind::Repository, "repo.name"),
            NameRule::Charset { .. }
        ));
    }

    #[test]
    fn test_build_project_rules() {
        assert!(is_compliant(ResourceKind::BuildProject, "aft-deployment-build"));
        assert!(matches!(
            rule_of(ResourceKind::BuildProject, "-build"),
            NameRule::Charset { .. }
        ));
        assert_eq!(
            rule_of(ResourceKind::BuildProject, "ab"),
            NameRule::Length { min: 3, max: 255 }
        );
    }

    #[test]
    fn test_pipeline_rules() {
        assert!(is_compliant(ResourceKind::Pipeline, "aft.deployment@pipeline"));
        assert!(matches!(
            rule_of(ResourceKind::Pipeline, "pipe line"),
            NameRule::Charset { .. }
        ));
    }

    #[test]
    fn test_stack_rules() {
        assert!(is_compliant(ResourceKind::Stack, "aft-deployment-cloudformation-stack"));
        assert!(matches!(
            rule_of(ResourceKind::Stack, "stack.name"),
            NameRule::Charset { .. }
        ));
    }

    #[test]
    fn test_account_id() {
        assert!(check_aws_account_id("123456789012").is_ok());
        assert!(check_aws_account_id("12345678901").is_err());
        assert!(check_aws_account_id("1234567890123").is_err());
        assert!(check_aws_account_id("12345678901a").is_err());
        assert!(check_aws_account_id("").is_err());
        assert!(check_aws_account_id("-12345678901").is_err());
    }
}
