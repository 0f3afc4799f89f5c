use crate::model::{RoomNumber, RoomType, StayWindow};

use super::inventory::is_free;

fn eligible(rn: &RoomNumber, window: &StayWindow) -> bool {
    !rn.is_deleted() && is_free(rn, window)
}

/// First-fit: the first live, in-service, unblocked room number in stored order.
pub fn find_available<'a>(rt: &'a RoomType, window: &StayWindow) -> Option<&'a RoomNumber> {
    if rt.is_deleted() {
        return None;
    }
    let found = rt.room_numbers.iter().find(|rn| eligible(rn, window));
    tracing::debug!(
        room_type = %rt.id,
        candidates = rt.room_numbers.len(),
        found = ?found.map(|rn| rn.id),
        "availability scan {}..{}",
        window.check_in,
        window.check_out
    );
    found
}

/// Room types with at least one bookable unit, each trimmed to just those units.
pub fn find_all_available(
    room_types: impl IntoIterator<Item = RoomType>,
    window: &StayWindow,
) -> Vec<RoomType> {
    room_types
        .into_iter()
        .filter(|rt| !rt.is_deleted())
        .filter_map(|mut rt| {
            rt.room_numbers.retain(|rn| eligible(rn, window));
            (!rt.room_numbers.is_empty()).then_some(rt)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use ulid::Ulid;

    use super::*;
    use crate::engine::inventory::{block, set_out_of_service};

    fn window(a: &str, b: &str) -> StayWindow {
        StayWindow::new(a.parse().unwrap(), b.parse().unwrap()).unwrap()
    }

    fn room_type(labels: &[&str]) -> RoomType {
        let id = Ulid::new();
        RoomType {
            id,
            hotel_id: Ulid::new(),
            name: "Deluxe Double".into(),
            description: String::new(),
            price_per_night: Decimal::from(100),
            max_adults: 2,
            max_children: 0,
            facilities: vec![],
            image_urls: vec![],
            room_numbers: labels
                .iter()
                .map(|l| RoomNumber::new(Ulid::new(), id, l.to_string()))
                .collect(),
            deleted_at: None,
        }
    }

    #[test]
    fn first_fit_skips_blocked_unit() {
        let mut rt = room_type(&["101", "102"]);
        let w = window("2025-06-01", "2025-06-03");
        block(&mut rt.room_numbers[0], Ulid::new(), w);

        let found = find_available(&rt, &w).unwrap();
        assert_eq!(found.label, "102");
    }

    #[test]
    fn first_fit_prefers_stored_order() {
        let rt = room_type(&["101", "102", "103"]);
        let found = find_available(&rt, &window("2025-06-01", "2025-06-03")).unwrap();
        assert_eq!(found.label, "101");
    }

    #[test]
    fn out_of_service_unit_is_skipped() {
        let mut rt = room_type(&["101"]);
        set_out_of_service(&mut rt.room_numbers[0], true);
        assert!(find_available(&rt, &window("2025-06-01", "2025-06-03")).is_none());
    }

    #[test]
    fn out_of_service_skipped_for_next_unit() {
        let mut rt = room_type(&["101", "102"]);
        set_out_of_service(&mut rt.room_numbers[0], true);
        let found = find_available(&rt, &window("2025-06-01", "2025-06-03")).unwrap();
        assert_eq!(found.label, "102");
    }

    #[test]
    fn deleted_or_empty_room_type_has_nothing() {
        let w = window("2025-06-01", "2025-06-03");
        assert!(find_available(&room_type(&[]), &w).is_none());

        let mut rt = room_type(&["101"]);
        rt.deleted_at = Some(Utc::now());
        assert!(find_available(&rt, &w).is_none());
    }

    #[test]
    fn deleted_unit_is_skipped() {
        let mut rt = room_type(&["101", "102"]);
        rt.room_numbers[0].deleted_at = Some(Utc::now());
        let found = find_available(&rt, &window("2025-06-01", "2025-06-03")).unwrap();
        assert_eq!(found.label, "102");
    }

    #[test]
    fn listing_trims_to_eligible_units() {
        let w = window("2025-06-01", "2025-06-03");
        let mut partial = room_type(&["101", "102", "103"]);
        block(&mut partial.room_numbers[0], Ulid::new(), w);
        set_out_of_service(&mut partial.room_numbers[2], true);

        let mut full = room_type(&["201"]);
        block(&mut full.room_numbers[0], Ulid::new(), window("2025-05-31", "2025-06-02"));

        let mut gone = room_type(&["301"]);
        gone.deleted_at = Some(Utc::now());

        let listed = find_all_available([partial.clone(), full, gone], &w);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, partial.id);
        let labels: Vec<_> = listed[0].room_numbers.iter().map(|rn| rn.label.as_str()).collect();
        assert_eq!(labels, vec!["102"]);
    }
}
