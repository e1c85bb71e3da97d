use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// First bookable hour of the day.
pub const OPENING_HOUR: u32 = 8;
/// Last hour a session may end (exclusive end of the grid).
pub const CLOSING_HOUR: u32 = 22;

/// One line of a booking: a service applied for a number of hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingService {
    pub service_id: String,
    pub service_name: String,
    pub price_per_hour: f64,
    pub hours: i64,
}

/// A studio session on the one-hour booking grid.
///
/// Client fields are denormalized at creation time so the booking stays
/// readable even if the client record is later edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration: i64,
    pub client_id: String,
    pub client_name: String,
    pub client_document: String,
    pub client_phone: String,
    #[serde(default)]
    pub services: Vec<BookingService>,
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities_completed: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        duration: i64,
        client_id: impl Into<String>,
        client_name: impl Into<String>,
        client_document: impl Into<String>,
        client_phone: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            start_time,
            duration,
            client_id: client_id.into(),
            client_name: client_name.into(),
            client_document: client_document.into(),
            client_phone: client_phone.into(),
            services: Vec::new(),
            total_revenue: 0.0,
            notes: None,
            activities_completed: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_services(mut self, services: Vec<BookingService>) -> Self {
        self.services = services;
        self.recompute_total();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Recomputes `total_revenue` from the service lines. Must be called
    /// after any mutation of `services`; the stored value is derived,
    /// never authoritative.
    pub fn recompute_total(&mut self) {
        self.total_revenue = self
            .services
            .iter()
            .map(|s| s.price_per_hour * s.hours as f64)
            .sum();
    }

    /// Hour of day the session starts.
    pub fn start_hour(&self) -> u32 {
        use chrono::Timelike;
        self.start_time.hour()
    }

    /// Exclusive end hour on the booking grid.
    pub fn end_hour(&self) -> i64 {
        self.start_hour() as i64 + self.duration
    }

    /// True when the session lies fully inside the bookable hours.
    pub fn within_opening_hours(&self) -> bool {
        self.start_hour() >= OPENING_HOUR && self.end_hour() <= CLOSING_HOUR as i64
    }

    /// True when two sessions on the same date overlap on the hour grid.
    pub fn conflicts_with(&self, other: &Booking) -> bool {
        if self.id == other.id || self.date != other.date {
            return false;
        }
        (self.start_hour() as i64) < other.end_hour() && (other.start_hour() as i64) < self.end_hour()
    }

    /// Total booked hours across all service lines.
    pub fn service_hours(&self) -> i64 {
        self.services.iter().map(|s| s.hours).sum()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking_at(date: &str, hour: u32, duration: i64) -> Booking {
        Booking::new(
            date.parse().unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            duration,
            "c1",
            "Mari",
            "52998224725",
            "11987654321",
        )
    }

    #[test]
    fn test_total_revenue_is_sum_of_price_times_hours() {
        let booking = booking_at("2024-03-10", 14, 4).with_services(vec![
            BookingService {
                service_id: "s1".into(),
                service_name: "Gravação".into(),
                price_per_hour: 100.0,
                hours: 2,
            },
            BookingService {
                service_id: "s2".into(),
                service_name: "Mixagem".into(),
                price_per_hour: 50.0,
                hours: 2,
            },
        ]);
        assert_eq!(booking.total_revenue, 300.0);
        assert_eq!(booking.service_hours(), 4);
    }

    #[test]
    fn test_recompute_total_after_edit() {
        let mut booking = booking_at("2024-03-10", 10, 1).with_services(vec![BookingService {
            service_id: "s1".into(),
            service_name: "Ensaio".into(),
            price_per_hour: 100.0,
            hours: 1,
        }]);
        booking.services[0].hours = 3;
        booking.recompute_total();
        assert_eq!(booking.total_revenue, 300.0);
    }

    #[test]
    fn test_opening_hours_bounds() {
        assert!(booking_at("2024-03-10", 8, 2).within_opening_hours());
        assert!(booking_at("2024-03-10", 20, 2).within_opening_hours());
        assert!(!booking_at("2024-03-10", 7, 2).within_opening_hours());
        assert!(!booking_at("2024-03-10", 21, 2).within_opening_hours());
    }

    #[test]
    fn test_conflict_detection_on_the_hour_grid() {
        let a = booking_at("2024-03-10", 10, 3); // 10..13
        let b = booking_at("2024-03-10", 12, 2); // 12..14, overlaps
        let c = booking_at("2024-03-10", 13, 2); // 13..15, touches only
        let d = booking_at("2024-03-11", 10, 3); // other day
        assert!(a.conflicts_with(&b));
        assert!(b.conflicts_with(&a));
        assert!(!a.conflicts_with(&c));
        assert!(!a.conflicts_with(&d));
        assert!(!a.conflicts_with(&a.clone()));
    }

    #[test]
    fn test_serde_field_names() {
        let booking = booking_at("2024-03-10", 10, 2);
        let value = serde_json::to_value(&booking).unwrap();
        assert!(value.get("clientId").is_some());
        assert!(value.get("startTime").is_some());
        assert!(value.get("totalRevenue").is_some());
        assert!(value.get("activitiesCompleted").is_none());
    }
}
