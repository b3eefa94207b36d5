use crate::core::{Change, ChangedField, FieldValue, Profile};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of history timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Field-level diff of two profile snapshots.
///
/// Every tracked attribute is compared on its own; `id` identifies the record
/// and is never part of a diff.
#[derive(Clone)]
pub struct ProfileDiffer {
    clock: Arc<dyn Clock>,
}

impl ProfileDiffer {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn diff(&self, previous: &Profile, next: &Profile) -> Change {
        let mut change = Change::new(self.clock.now());

        let text_fields = [
            ("firstName", &previous.first_name, &next.first_name),
            ("lastName", &previous.last_name, &next.last_name),
            ("address", &previous.address, &next.address),
            ("phone", &previous.phone, &next.phone),
        ];
        for (name, before, after) in text_fields {
            if before != after {
                record(&mut change, name, before.as_str(), after.as_str());
            }
        }

        if previous.age != next.age {
            record(&mut change, "age", previous.age, next.age);
        }

        change
    }
}

impl Default for ProfileDiffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProfileDiffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileDiffer").finish_non_exhaustive()
    }
}

fn record<V: Into<FieldValue>>(change: &mut Change, name: &str, previous: V, current: V) {
    change.fields.insert(
        name.to_string(),
        ChangedField {
            previous: previous.into(),
            current: current.into(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn differ() -> ProfileDiffer {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ProfileDiffer::with_clock(Arc::new(FixedClock(instant)))
    }

    fn sample() -> Profile {
        Profile {
            id: "p-1".into(),
            first_name: "John".into(),
            last_name: "Smith".into(),
            address: "100 E. 17th Street".into(),
            phone: "+1-212-674-4300".into(),
            age: 30,
        }
    }

    #[test]
    fn test_identical_profiles_have_no_changes() {
        let p = sample();
        assert!(differ().diff(&p, &p).is_empty());
        assert!(differ().diff(&Profile::default(), &Profile::default()).is_empty());
    }

    #[test]
    fn test_age_only_change() {
        let p = sample();
        let mut q = p.clone();
        q.age = 31;

        let change = differ().diff(&p, &q);
        assert_eq!(change.len(), 1);
        let age = change.field("age").unwrap();
        assert_eq!(age.previous, FieldValue::Integer(30));
        assert_eq!(age.current, FieldValue::Integer(31));
    }

    #[test]
    fn test_id_is_never_compared() {
        let p = sample();
        let mut q = p.clone();
        q.id = "p-2".into();
        assert!(differ().diff(&p, &q).is_empty());
    }

    #[test]
    fn test_every_attribute_is_tracked() {
        let empty = Profile::empty("p-1");
        let change = differ().diff(&empty, &sample());

        let names: Vec<&str> = change.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["address", "age", "firstName", "lastName", "phone"]);
        assert_eq!(
            change.field("firstName").unwrap(),
            &ChangedField {
                previous: FieldValue::from(""),
                current: FieldValue::from("John"),
            }
        );
    }

    #[test]
    fn test_diff_is_deterministic() {
        let p = sample();
        let mut q = p.clone();
        q.phone = "555".into();
        q.last_name = "Doe".into();

        let first = ProfileDiffer::new().diff(&p, &q);
        let second = ProfileDiffer::new().diff(&p, &q);
        assert_eq!(first.fields, second.fields);
    }

    #[test]
    fn test_timestamp_comes_from_clock() {
        let instant = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let differ = ProfileDiffer::with_clock(Arc::new(FixedClock(instant)));
        assert_eq!(differ.diff(&sample(), &sample()).timestamp, instant);
    }
}
