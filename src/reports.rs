//! Financial and hours reporting over the booking history.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::Booking;

/// Filter over bookings; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub client_id: Option<String>,
    /// Matches bookings containing a service line with this id.
    pub service_id: Option<String>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(start) = self.start {
            if booking.date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if booking.date > end {
                return false;
            }
        }
        if let Some(client_id) = &self.client_id {
            if &booking.client_id != client_id {
                return false;
            }
        }
        if let Some(service_id) = &self.service_id {
            if !booking.services.iter().any(|s| &s.service_id == service_id) {
                return false;
            }
        }
        true
    }
}

pub fn filter_bookings<'a>(bookings: &'a [Booking], filter: &BookingFilter) -> Vec<&'a Booking> {
    bookings.iter().filter(|b| filter.matches(b)).collect()
}

/// Revenue attributed to one catalog service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceRevenue {
    pub revenue: f64,
    pub hours: i64,
    pub sessions: usize,
}

/// One client's share of the filtered revenue.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRevenue {
    pub client_id: String,
    pub name: String,
    pub revenue: f64,
    pub sessions: usize,
}

/// Aggregate financial view over a set of bookings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialStats {
    pub total_revenue: f64,
    pub total_bookings: usize,
    pub total_hours: i64,
    pub unique_clients: usize,
    pub avg_revenue_per_booking: f64,
    pub avg_revenue_per_hour: f64,
    pub service_revenue: BTreeMap<String, ServiceRevenue>,
    /// Top five clients by revenue, descending.
    pub top_clients: Vec<ClientRevenue>,
}

impl FinancialStats {
    pub fn collect(bookings: &[Booking], filter: &BookingFilter) -> Self {
        let selected = filter_bookings(bookings, filter);
        let mut stats = FinancialStats {
            total_bookings: selected.len(),
            ..Default::default()
        };

        let mut clients: BTreeMap<&str, ClientRevenue> = BTreeMap::new();
        for booking in &selected {
            stats.total_revenue += booking.total_revenue;
            stats.total_hours += booking.duration;

            for line in &booking.services {
                let entry = stats
                    .service_revenue
                    .entry(line.service_name.clone())
                    .or_default();
                entry.revenue += line.price_per_hour * line.hours as f64;
                entry.hours += line.hours;
                entry.sessions += 1;
            }

            let entry = clients
                .entry(booking.client_id.as_str())
                .or_insert_with(|| ClientRevenue {
                    client_id: booking.client_id.clone(),
                    name: booking.client_name.clone(),
                    revenue: 0.0,
                    sessions: 0,
                });
            entry.revenue += booking.total_revenue;
            entry.sessions += 1;
        }

        stats.unique_clients = clients.len();
        if stats.total_bookings > 0 {
            stats.avg_revenue_per_booking = stats.total_revenue / stats.total_bookings as f64;
        }
        if stats.total_hours > 0 {
            stats.avg_revenue_per_hour = stats.total_revenue / stats.total_hours as f64;
        }

        let mut ranked: Vec<ClientRevenue> = clients.into_values().collect();
        ranked.sort_by(|a, b| {
            b.revenue
                .partial_cmp(&a.revenue)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(5);
        stats.top_clients = ranked;

        stats
    }
}

/// One client's booked hours over a period.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientHours {
    pub client_id: String,
    pub name: String,
    pub hours: i64,
    pub sessions: usize,
}

/// Hours and sessions per client, most hours first.
pub fn hours_by_client(bookings: &[Booking], filter: &BookingFilter) -> Vec<ClientHours> {
    let mut clients: BTreeMap<&str, ClientHours> = BTreeMap::new();
    for booking in filter_bookings(bookings, filter) {
        let entry = clients
            .entry(booking.client_id.as_str())
            .or_insert_with(|| ClientHours {
                client_id: booking.client_id.clone(),
                name: booking.client_name.clone(),
                hours: 0,
                sessions: 0,
            });
        entry.hours += booking.duration;
        entry.sessions += 1;
    }
    let mut ranked: Vec<ClientHours> = clients.into_values().collect();
    ranked.sort_by(|a, b| b.hours.cmp(&a.hours));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingService;
    use chrono::NaiveTime;

    fn booking(date: &str, client_id: &str, name: &str, price: f64, hours: i64) -> Booking {
        Booking::new(
            date.parse().unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            hours,
            client_id,
            name,
            "52998224725",
            "119",
        )
        .with_services(vec![BookingService {
            service_id: "s1".into(),
            service_name: "Gravação".into(),
            price_per_hour: price,
            hours,
        }])
    }

    #[test]
    fn test_financial_totals_and_averages() {
        let bookings = vec![
            booking("2024-03-01", "c1", "Maria", 100.0, 2),
            booking("2024-03-02", "c2", "Ana", 50.0, 2),
        ];
        let stats = FinancialStats::collect(&bookings, &BookingFilter::default());

        assert_eq!(stats.total_revenue, 300.0);
        assert_eq!(stats.total_bookings, 2);
        assert_eq!(stats.total_hours, 4);
        assert_eq!(stats.unique_clients, 2);
        assert_eq!(stats.avg_revenue_per_booking, 150.0);
        assert_eq!(stats.avg_revenue_per_hour, 75.0);

        let gravacao = &stats.service_revenue["Gravação"];
        assert_eq!(gravacao.revenue, 300.0);
        assert_eq!(gravacao.hours, 4);
        assert_eq!(gravacao.sessions, 2);
    }

    #[test]
    fn test_top_clients_ranked_and_capped() {
        let mut bookings = Vec::new();
        for i in 0..7 {
            bookings.push(booking(
                "2024-03-01",
                &format!("c{}", i),
                &format!("Cliente {}", i),
                100.0 * (i + 1) as f64,
                1,
            ));
        }
        let stats = FinancialStats::collect(&bookings, &BookingFilter::default());
        assert_eq!(stats.top_clients.len(), 5);
        assert_eq!(stats.top_clients[0].client_id, "c6");
        assert!(stats.top_clients[0].revenue > stats.top_clients[4].revenue);
    }

    #[test]
    fn test_date_and_client_filters() {
        let bookings = vec![
            booking("2024-03-01", "c1", "Maria", 100.0, 2),
            booking("2024-03-15", "c1", "Maria", 100.0, 3),
            booking("2024-03-15", "c2", "Ana", 100.0, 1),
        ];
        let filter = BookingFilter {
            start: Some("2024-03-10".parse().unwrap()),
            end: Some("2024-03-31".parse().unwrap()),
            client_id: Some("c1".into()),
            ..Default::default()
        };
        let stats = FinancialStats::collect(&bookings, &filter);
        assert_eq!(stats.total_bookings, 1);
        assert_eq!(stats.total_hours, 3);
    }

    #[test]
    fn test_service_filter() {
        let bookings = vec![booking("2024-03-01", "c1", "Maria", 100.0, 2)];
        let hit = BookingFilter {
            service_id: Some("s1".into()),
            ..Default::default()
        };
        let miss = BookingFilter {
            service_id: Some("nope".into()),
            ..Default::default()
        };
        assert_eq!(filter_bookings(&bookings, &hit).len(), 1);
        assert!(filter_bookings(&bookings, &miss).is_empty());
    }

    #[test]
    fn test_empty_set_has_zero_averages() {
        let stats = FinancialStats::collect(&[], &BookingFilter::default());
        assert_eq!(stats.avg_revenue_per_booking, 0.0);
        assert_eq!(stats.avg_revenue_per_hour, 0.0);
    }

    #[test]
    fn test_hours_by_client_ranking() {
        let bookings = vec![
            booking("2024-03-01", "c1", "Maria", 100.0, 2),
            booking("2024-03-02", "c2", "Ana", 100.0, 5),
            booking("2024-03-03", "c1", "Maria", 100.0, 1),
        ];
        let report = hours_by_client(&bookings, &BookingFilter::default());
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].client_id, "c2");
        assert_eq!(report[0].hours, 5);
        assert_eq!(report[1].hours, 3);
        assert_eq!(report[1].sessions, 2);
    }
}
