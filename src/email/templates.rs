use chrono::{NaiveDate, NaiveTime};

/// Transactional emails the API sends
#[derive(Debug, Clone, PartialEq)]
pub enum EmailTemplate {
    BookingConfirmation {
        client_name: String,
        service_name: String,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        pet_names: Vec<String>,
    },
    BookingCancelled {
        client_name: String,
        service_name: String,
        date: NaiveDate,
        start_time: NaiveTime,
    },
    Welcome {
        name: String,
        site_url: String,
    },
}

impl EmailTemplate {
    pub fn subject(&self) -> String {
        match self {
            EmailTemplate::BookingConfirmation { service_name, date, .. } => {
                format!("Booking confirmed: {} on {}", service_name, format_date(*date))
            }
            EmailTemplate::BookingCancelled { service_name, date, .. } => {
                format!("Booking cancelled: {} on {}", service_name, format_date(*date))
            }
            EmailTemplate::Welcome { .. } => "Welcome to the daycare".to_string(),
        }
    }

    pub fn render_html(&self) -> String {
        let body = match self {
            EmailTemplate::BookingConfirmation {
                client_name,
                service_name,
                date,
                start_time,
                end_time,
                pet_names,
            } => {
                let pets: String = pet_names
                    .iter()
                    .map(|name| format!("<li>{}</li>", escape_html(name)))
                    .collect();
                format!(
                    "<p>Hi {},</p>\
                     <p>Your booking for <strong>{}</strong> is confirmed.</p>\
                     <p>{} from {} to {}</p>\
                     <ul>{}</ul>",
                    escape_html(client_name),
                    escape_html(service_name),
                    format_date(*date),
                    start_time.format("%H:%M"),
                    end_time.format("%H:%M"),
                    pets
                )
            }
            EmailTemplate::BookingCancelled {
                client_name,
                service_name,
                date,
                start_time,
            } => format!(
                "<p>Hi {},</p>\
                 <p>Your booking for <strong>{}</strong> on {} at {} has been cancelled.</p>",
                escape_html(client_name),
                escape_html(service_name),
                format_date(*date),
                start_time.format("%H:%M")
            ),
            EmailTemplate::Welcome { name, site_url } => format!(
                "<p>Hi {},</p>\
                 <p>Your account is ready. Sign in at <a href=\"{}\">{}</a> to book a visit.</p>",
                escape_html(name),
                escape_html(site_url),
                escape_html(site_url)
            ),
        };

        format!(
            "<!DOCTYPE html><html><body style=\"font-family: sans-serif\">{}</body></html>",
            body
        )
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%A %-d %B %Y").to_string()
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmation() -> EmailTemplate {
        EmailTemplate::BookingConfirmation {
            client_name: "Sam".to_string(),
            service_name: "Day Care".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            pet_names: vec!["Biscuit".to_string(), "Rex".to_string()],
        }
    }

    #[test]
    fn confirmation_subject_names_service_and_day() {
        assert_eq!(confirmation().subject(), "Booking confirmed: Day Care on Monday 2 March 2026");
    }

    #[test]
    fn confirmation_lists_pets_and_times() {
        let html = confirmation().render_html();
        assert!(html.contains("<li>Biscuit</li><li>Rex</li>"));
        assert!(html.contains("from 09:00 to 10:30"));
    }

    #[test]
    fn user_text_is_escaped() {
        let html = EmailTemplate::Welcome {
            name: "<script>alert('x')</script>".to_string(),
            site_url: "https://app.example.com/?a=1&b=2".to_string(),
        }
        .render_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("a=1&amp;b=2"));
    }

    #[test]
    fn escape_leaves_plain_text_alone() {
        assert_eq!(escape_html("Biscuit the Beagle"), "Biscuit the Beagle");
    }
}
