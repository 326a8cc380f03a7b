//! Guest-list CSV export.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::Registration;

const HEADER: &str = "Name,Email,Contact Number,Registered At";
const VERIFIED_HEADER: &str = "Name,Email,Contact Number,Registered At,Checked In At";

/// Which guests end up in the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestList {
    All,
    /// Checked-in guests only, with the check-in timestamp column.
    Verified,
}

impl GuestList {
    pub fn filename(self, slug: &str) -> String {
        match self {
            GuestList::All => format!("{slug}-guest-list.csv"),
            GuestList::Verified => format!("{slug}-verified-guest-list.csv"),
        }
    }
}

/// Renders form registrations as CSV. Every value is quoted with inner quotes doubled.
pub fn guest_list_csv(registrations: &[Registration], list: GuestList) -> String {
    let header = match list {
        GuestList::All => HEADER,
        GuestList::Verified => VERIFIED_HEADER,
    };

    let rows = registrations
        .iter()
        .filter(|r| r.is_guest())
        .filter(|r| list == GuestList::All || r.checked_in)
        .map(|r| {
            let mut fields = vec![
                quote(&r.name),
                quote(&r.email),
                quote(r.contact_number.as_deref().unwrap_or_default()),
                quote(&timestamp(r.registered_at)),
            ];
            if list == GuestList::Verified {
                fields.push(quote(&r.checked_in_at.map(timestamp).unwrap_or_default()));
            }
            fields.join(",")
        });

    std::iter::once(header.to_string())
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistrationSource;
    use chrono::TimeZone;

    fn registration(name: &str, source: RegistrationSource, checked_in: bool) -> Registration {
        let at = Utc.with_ymd_and_hms(2025, 7, 1, 18, 30, 0).unwrap();
        Registration {
            id: format!("id-{name}"),
            event_id: "e1".to_string(),
            name: name.to_string(),
            email: format!("{}@x.com", name.to_lowercase()),
            contact_number: None,
            registered_at: at,
            source,
            checked_in,
            checked_in_at: checked_in.then_some(at),
        }
    }

    #[test]
    fn test_all_guests_export() {
        let registrations = vec![
            registration("Jane", RegistrationSource::Form, false),
            registration("Visitor", RegistrationSource::SharedLink, false),
        ];

        let csv = guest_list_csv(&registrations, GuestList::All);

        assert_eq!(
            csv,
            "Name,Email,Contact Number,Registered At\n\
             \"Jane\",\"jane@x.com\",\"\",\"2025-07-01T18:30:00.000Z\""
        );
    }

    #[test]
    fn test_verified_export_only_checked_in() {
        let mut quoted = registration("Ann \"Red\" Lee", RegistrationSource::Form, true);
        quoted.contact_number = Some("+1 555".to_string());
        let registrations = vec![quoted, registration("Bob", RegistrationSource::Form, false)];

        let csv = guest_list_csv(&registrations, GuestList::Verified);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], VERIFIED_HEADER);
        assert!(lines[1].starts_with("\"Ann \"\"Red\"\" Lee\","));
        assert!(lines[1].ends_with(",\"+1 555\",\"2025-07-01T18:30:00.000Z\",\"2025-07-01T18:30:00.000Z\""));
    }

    #[test]
    fn test_filenames() {
        assert_eq!(GuestList::All.filename("summer-fest"), "summer-fest-guest-list.csv");
        assert_eq!(
            GuestList::Verified.filename("summer-fest"),
            "summer-fest-verified-guest-list.csv"
        );
    }
}
