use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{is_active_at, Campaign, CampaignDraft, CampaignSettings, MAX_DESCRIPTION_LENGTH};

/// Deployment-specific rules applied when campaigns are created or updated.
#[derive(Clone, Debug)]
pub struct ValidationPolicy {
    /// The shortest allowed distance between a campaign's start and end.
    pub minimum_duration: Duration,
    /// Overwrite the submitted `active` flag with the one derived from the clock.
    pub derive_active: bool,
    /// On update, only accept dates later than the stored ones.
    pub extend_only_updates: bool,
}

impl Default for ValidationPolicy {
    fn default() -> ValidationPolicy {
        ValidationPolicy {
            minimum_duration: Duration::days(1),
            derive_active: true,
            extend_only_updates: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING-KEBAB-CASE")]
pub enum ValidationError {
    FieldConstraintViolation {
        field: &'static str,
        message: &'static str,
    },
    InvalidStartDate {
        start_date: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    InvalidEndDate {
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        /// `None` when the earliest allowed end date is past the representable range.
        minimum_end_date: Option<DateTime<Utc>>,
    },
}

fn violation(field: &'static str, message: &'static str) -> ValidationError {
    ValidationError::FieldConstraintViolation { field, message }
}

/// Checks presence and ranges of the draft's fields, stopping at the first violation.
pub fn check_fields(draft: &CampaignDraft) -> Result<CampaignSettings, ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(violation("name", "Campaign name is required"));
    }

    if let Some(description) = &draft.description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(violation(
                "description",
                "Campaign description cannot exceed 1000 characters",
            ));
        }
    }

    let start_date = draft
        .start_date
        .ok_or_else(|| violation("start_date", "Start date is required"))?;
    let end_date = draft
        .end_date
        .ok_or_else(|| violation("end_date", "End date is required"))?;

    let max_attempts = draft
        .max_attempts
        .ok_or_else(|| violation("max_attempts", "Max attempts is required"))?;
    if max_attempts < 1 {
        return Err(violation(
            "max_attempts",
            "Max attempts must be greater than or equal to 1",
        ));
    }

    let pass_percentage = draft
        .pass_percentage
        .ok_or_else(|| violation("pass_percentage", "Pass percentage is required"))?;
    if pass_percentage < 0 {
        return Err(violation(
            "pass_percentage",
            "Pass percentage cannot be negative",
        ));
    }
    if pass_percentage > 100 {
        return Err(violation(
            "pass_percentage",
            "Pass percentage cannot be greater than 100",
        ));
    }

    Ok(CampaignSettings {
        name: draft.name.clone(),
        short_name: draft.short_name.clone(),
        description: draft.description.clone(),
        start_date,
        end_date,
        max_attempts,
        pass_percentage,
        active: draft.active,
        archived: draft.archived,
    })
}

fn check_start_date(start_date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if start_date < now {
        return Err(ValidationError::InvalidStartDate { start_date, now });
    }

    Ok(())
}

fn check_end_date(
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    minimum_duration: Duration,
) -> Result<(), ValidationError> {
    let minimum_end_date = start_date.checked_add_signed(minimum_duration);
    let too_short = match minimum_end_date {
        Some(minimum_end_date) => end_date < minimum_end_date,
        None => true,
    };
    if end_date <= start_date || too_short {
        return Err(ValidationError::InvalidEndDate {
            start_date,
            end_date,
            minimum_end_date,
        });
    }

    Ok(())
}

/// Runs every check against a new candidate. The draft's `active` flag is
/// passed through untouched.
pub fn validate(
    draft: &CampaignDraft,
    now: DateTime<Utc>,
    policy: &ValidationPolicy,
) -> Result<CampaignSettings, ValidationError> {
    let settings = check_fields(draft)?;
    check_start_date(settings.start_date, now)?;
    check_end_date(settings.start_date, settings.end_date, policy.minimum_duration)?;

    Ok(settings)
}

/// Replaces `active` with whether `now` falls in the settings' window.
pub fn derive_activation(mut settings: CampaignSettings, now: DateTime<Utc>) -> CampaignSettings {
    settings.active = is_active_at(settings.start_date, settings.end_date, now);
    settings
}

pub fn validate_for_create(
    draft: &CampaignDraft,
    now: DateTime<Utc>,
    policy: &ValidationPolicy,
) -> Result<CampaignSettings, ValidationError> {
    let settings = validate(draft, now, policy)?;

    if policy.derive_active {
        Ok(derive_activation(settings, now))
    } else {
        Ok(settings)
    }
}

/// Validates a draft against an existing campaign and merges the two.
///
/// With `extend_only_updates`, submitted dates that are not later than the
/// stored ones are ignored. The start date only has to lie in the future when
/// it actually changes, so a running campaign can still be edited.
pub fn validate_for_update(
    existing: &Campaign,
    draft: &CampaignDraft,
    now: DateTime<Utc>,
    policy: &ValidationPolicy,
) -> Result<CampaignSettings, ValidationError> {
    let mut settings = check_fields(draft)?;

    if policy.extend_only_updates {
        if settings.start_date <= existing.start_date {
            settings.start_date = existing.start_date;
        }
        if settings.end_date <= existing.end_date {
            settings.end_date = existing.end_date;
        }
    }

    if settings.start_date != existing.start_date {
        check_start_date(settings.start_date, now)?;
    }
    check_end_date(settings.start_date, settings.end_date, policy.minimum_duration)?;

    if policy.derive_active {
        Ok(derive_activation(settings, now))
    } else {
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::tests::test_campaign;

    fn draft(start: DateTime<Utc>, end: DateTime<Utc>) -> CampaignDraft {
        CampaignDraft {
            name: "Spring Assessment".into(),
            short_name: Some("SA".into()),
            description: Some("Quarterly skills check".into()),
            start_date: Some(start),
            end_date: Some(end),
            max_attempts: Some(3),
            pass_percentage: Some(70),
            active: false,
            archived: false,
        }
    }

    #[test]
    fn accepts_valid_draft() {
        let now = Utc::now();
        let draft = draft(now + Duration::hours(1), now + Duration::days(2));

        let settings = validate(&draft, now, &ValidationPolicy::default()).unwrap();

        assert_eq!(settings.name, "Spring Assessment");
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.pass_percentage, 70);
        assert!(!settings.archived);
    }

    #[test]
    fn rejects_blank_name() {
        let now = Utc::now();
        let mut draft = draft(now + Duration::hours(1), now + Duration::days(2));
        draft.name = "   ".into();

        let result = validate(&draft, now, &ValidationPolicy::default());

        assert!(matches!(
            result,
            Err(ValidationError::FieldConstraintViolation { field: "name", .. })
        ));
    }

    #[test]
    fn rejects_long_description() {
        let now = Utc::now();
        let mut draft = draft(now + Duration::hours(1), now + Duration::days(2));
        draft.description = Some("x".repeat(MAX_DESCRIPTION_LENGTH + 1));

        let result = validate(&draft, now, &ValidationPolicy::default());

        assert!(matches!(
            result,
            Err(ValidationError::FieldConstraintViolation {
                field: "description",
                ..
            })
        ));
    }

    #[test]
    fn rejects_missing_dates() {
        let now = Utc::now();
        let mut draft = draft(now + Duration::hours(1), now + Duration::days(2));
        draft.end_date = None;

        let result = validate(&draft, now, &ValidationPolicy::default());

        assert!(matches!(
            result,
            Err(ValidationError::FieldConstraintViolation {
                field: "end_date",
                ..
            })
        ));
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let now = Utc::now();
        let policy = ValidationPolicy::default();

        let mut zero_attempts = draft(now + Duration::hours(1), now + Duration::days(2));
        zero_attempts.max_attempts = Some(0);
        assert!(matches!(
            validate(&zero_attempts, now, &policy),
            Err(ValidationError::FieldConstraintViolation {
                field: "max_attempts",
                ..
            })
        ));

        for percentage in &[-1, 101] {
            let mut bad_percentage = draft(now + Duration::hours(1), now + Duration::days(2));
            bad_percentage.pass_percentage = Some(*percentage);
            assert!(matches!(
                validate(&bad_percentage, now, &policy),
                Err(ValidationError::FieldConstraintViolation {
                    field: "pass_percentage",
                    ..
                })
            ));
        }

        let mut edges = draft(now + Duration::hours(1), now + Duration::days(2));
        edges.max_attempts = Some(1);
        edges.pass_percentage = Some(0);
        assert!(validate(&edges, now, &policy).is_ok());
        edges.pass_percentage = Some(100);
        assert!(validate(&edges, now, &policy).is_ok());
    }

    #[test]
    fn field_checks_run_before_date_checks() {
        let now = Utc::now();
        let mut draft = draft(now - Duration::days(1), now);
        draft.max_attempts = None;

        let result = validate(&draft, now, &ValidationPolicy::default());

        assert!(matches!(
            result,
            Err(ValidationError::FieldConstraintViolation {
                field: "max_attempts",
                ..
            })
        ));
    }

    #[test]
    fn rejects_start_in_the_past() {
        let now = Utc::now();
        let start = now - Duration::seconds(1);
        let draft = draft(start, now + Duration::days(5));

        let result = validate(&draft, now, &ValidationPolicy::default());

        assert_eq!(
            result,
            Err(ValidationError::InvalidStartDate {
                start_date: start,
                now
            })
        );
    }

    #[test]
    fn rejects_window_shorter_than_minimum() {
        let now = Utc::now();
        let start = now + Duration::hours(1);
        let end = start + Duration::hours(23);
        let draft = draft(start, end);

        let result = validate(&draft, now, &ValidationPolicy::default());

        assert_eq!(
            result,
            Err(ValidationError::InvalidEndDate {
                start_date: start,
                end_date: end,
                minimum_end_date: Some(start + Duration::days(1)),
            })
        );
    }

    #[test]
    fn minimum_duration_is_configurable() {
        let now = Utc::now();
        let start = now + Duration::hours(1);
        let draft = draft(start, start + Duration::days(30));
        let policy = ValidationPolicy {
            minimum_duration: Duration::days(90),
            ..ValidationPolicy::default()
        };

        assert!(matches!(
            validate(&draft, now, &policy),
            Err(ValidationError::InvalidEndDate { .. })
        ));

        let draft = self::draft(start, start + Duration::days(90));
        assert!(validate(&draft, now, &policy).is_ok());
    }

    #[test]
    fn rejects_window_ending_past_representable_dates() {
        let draft: CampaignDraft = serde_json::from_value(serde_json::json!({
            "name": "Far Future",
            "start_date": "+262142-12-31T00:00:00Z",
            "end_date": "+262142-12-31T12:00:00Z",
            "max_attempts": 1,
            "pass_percentage": 50,
        }))
        .unwrap();

        let result = validate_for_create(&draft, Utc::now(), &ValidationPolicy::default());

        assert!(matches!(
            result,
            Err(ValidationError::InvalidEndDate {
                minimum_end_date: None,
                ..
            })
        ));
    }

    #[test]
    fn validate_leaves_active_as_submitted() {
        let now = Utc::now();
        let mut draft = draft(now + Duration::hours(1), now + Duration::days(2));
        draft.active = true;

        let settings = validate(&draft, now, &ValidationPolicy::default()).unwrap();

        assert!(settings.active);
    }

    #[test]
    fn create_derives_active_from_clock() {
        let now = Utc::now();
        let mut future = draft(now + Duration::hours(1), now + Duration::days(2));
        future.active = true;

        let policy = ValidationPolicy::default();

        let settings = validate_for_create(&future, now, &policy).unwrap();
        assert!(!settings.active);

        let started = draft(now, now + Duration::days(2));
        let settings = validate_for_create(&started, now, &policy).unwrap();
        assert!(settings.active);
    }

    #[test]
    fn create_without_derivation_keeps_submitted_flag() {
        let now = Utc::now();
        let mut draft = draft(now + Duration::hours(1), now + Duration::days(2));
        draft.active = true;
        let policy = ValidationPolicy {
            derive_active: false,
            ..ValidationPolicy::default()
        };

        let settings = validate_for_create(&draft, now, &policy).unwrap();

        assert!(settings.active);
    }

    #[test]
    fn update_ignores_earlier_dates() {
        let now = Utc::now();
        let start = now + Duration::days(10);
        let end = now + Duration::days(20);
        let existing = test_campaign(1, start, end);

        let earlier = draft(start - Duration::days(1), end - Duration::days(1));
        let settings =
            validate_for_update(&existing, &earlier, now, &ValidationPolicy::default()).unwrap();

        assert_eq!(settings.start_date, start);
        assert_eq!(settings.end_date, end);
    }

    #[test]
    fn update_accepts_later_dates() {
        let now = Utc::now();
        let start = now + Duration::days(10);
        let end = now + Duration::days(20);
        let existing = test_campaign(1, start, end);

        let later = draft(start + Duration::days(1), end + Duration::days(1));
        let settings =
            validate_for_update(&existing, &later, now, &ValidationPolicy::default()).unwrap();

        assert_eq!(settings.start_date, start + Duration::days(1));
        assert_eq!(settings.end_date, end + Duration::days(1));
    }

    #[test]
    fn update_can_shorten_when_extend_only_is_off() {
        let now = Utc::now();
        let start = now + Duration::days(10);
        let end = now + Duration::days(20);
        let existing = test_campaign(1, start, end);
        let policy = ValidationPolicy {
            extend_only_updates: false,
            ..ValidationPolicy::default()
        };

        let earlier = draft(start - Duration::days(1), end - Duration::days(1));
        let settings = validate_for_update(&existing, &earlier, now, &policy).unwrap();

        assert_eq!(settings.start_date, start - Duration::days(1));
        assert_eq!(settings.end_date, end - Duration::days(1));
    }

    #[test]
    fn update_allows_editing_running_campaign() {
        let now = Utc::now();
        let start = now - Duration::days(2);
        let end = now + Duration::days(2);
        let existing = test_campaign(1, start, end);

        let mut resubmitted = draft(start, end);
        resubmitted.name = "Renamed".into();
        let settings =
            validate_for_update(&existing, &resubmitted, now, &ValidationPolicy::default())
                .unwrap();

        assert_eq!(settings.name, "Renamed");
        assert!(settings.active);
    }

    #[test]
    fn update_still_checks_fields() {
        let now = Utc::now();
        let existing = test_campaign(1, now + Duration::days(1), now + Duration::days(3));
        let mut draft = draft(now + Duration::days(1), now + Duration::days(3));
        draft.pass_percentage = Some(250);

        let result = validate_for_update(&existing, &draft, now, &ValidationPolicy::default());

        assert!(matches!(
            result,
            Err(ValidationError::FieldConstraintViolation {
                field: "pass_percentage",
                ..
            })
        ));
    }
}
