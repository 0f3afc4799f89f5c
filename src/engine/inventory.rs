//! Blocked-range bookkeeping for a single room number.
//!
//! None of these functions persist or lock; the caller holds the owning
//! room type's write lock.

use ulid::Ulid;

use crate::model::{BlockedRange, RoomNumber, StayWindow};

/// What `unblock` does with the booking's entry in the audit list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTrail {
    /// Cancellation: the booking id stays on the room number.
    Keep,
    /// Hard delete: the booking id is removed.
    Prune,
}

/// False if the unit is out of service or any block overlaps `window`.
pub fn is_free(rn: &RoomNumber, window: &StayWindow) -> bool {
    !rn.is_out_of_service && rn.overlapping(window).next().is_none()
}

/// Insert a block keeping `unavailable` sorted by check-in, and record the
/// booking in the audit list.
pub fn block(rn: &mut RoomNumber, booking_id: Ulid, window: StayWindow) {
    let pos = rn
        .unavailable
        .partition_point(|b| b.window.check_in <= window.check_in);
    rn.unavailable.insert(pos, BlockedRange { booking_id, window });
    rn.booking_ids.push(booking_id);
}

/// Remove the blocks `booking_id` placed inside `window`. Returns how many
/// ranges were removed.
pub fn unblock(rn: &mut RoomNumber, booking_id: Ulid, window: StayWindow, audit: AuditTrail) -> usize {
    let before = rn.unavailable.len();
    rn.unavailable
        .retain(|b| !(b.booking_id == booking_id && window.contains_window(&b.window)));
    if audit == AuditTrail::Prune {
        rn.booking_ids.retain(|id| *id != booking_id);
    }
    before - rn.unavailable.len()
}

pub fn set_out_of_service(rn: &mut RoomNumber, flag: bool) {
    rn.is_out_of_service = flag;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(a: &str, b: &str) -> StayWindow {
        StayWindow::new(a.parse().unwrap(), b.parse().unwrap()).unwrap()
    }

    fn room() -> RoomNumber {
        RoomNumber::new(Ulid::new(), Ulid::new(), "101".into())
    }

    #[test]
    fn fresh_room_is_free() {
        assert!(is_free(&room(), &window("2025-06-01", "2025-06-03")));
    }

    #[test]
    fn block_makes_window_unavailable() {
        let mut rn = room();
        let id = Ulid::new();
        block(&mut rn, id, window("2025-06-01", "2025-06-03"));
        assert!(!is_free(&rn, &window("2025-06-02", "2025-06-04")));
        assert!(is_free(&rn, &window("2025-06-03", "2025-06-05")));
        assert!(is_free(&rn, &window("2025-05-30", "2025-06-01")));
        assert_eq!(rn.booking_ids, vec![id]);
    }

    #[test]
    fn blocks_stay_sorted() {
        let mut rn = room();
        block(&mut rn, Ulid::new(), window("2025-06-10", "2025-06-12"));
        block(&mut rn, Ulid::new(), window("2025-06-01", "2025-06-03"));
        block(&mut rn, Ulid::new(), window("2025-06-05", "2025-06-06"));
        let starts: Vec<_> = rn.unavailable.iter().map(|b| b.window.check_in).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn out_of_service_is_never_free() {
        let mut rn = room();
        set_out_of_service(&mut rn, true);
        assert!(!is_free(&rn, &window("2025-06-01", "2025-06-03")));
        assert!(rn.unavailable.is_empty());
        set_out_of_service(&mut rn, false);
        assert!(is_free(&rn, &window("2025-06-01", "2025-06-03")));
    }

    #[test]
    fn unblock_keeps_audit_entry() {
        let mut rn = room();
        let id = Ulid::new();
        let w = window("2025-06-01", "2025-06-03");
        block(&mut rn, id, w);
        assert_eq!(unblock(&mut rn, id, w, AuditTrail::Keep), 1);
        assert!(is_free(&rn, &w));
        assert_eq!(rn.booking_ids, vec![id]);
    }

    #[test]
    fn unblock_prune_drops_audit_entry() {
        let mut rn = room();
        let id = Ulid::new();
        let w = window("2025-06-01", "2025-06-03");
        block(&mut rn, id, w);
        unblock(&mut rn, id, w, AuditTrail::Prune);
        assert!(rn.booking_ids.is_empty());
    }

    #[test]
    fn unblock_leaves_other_bookings_alone() {
        // Adjacent stays share a boundary day; only the target range goes.
        let mut rn = room();
        let (a, b) = (Ulid::new(), Ulid::new());
        block(&mut rn, a, window("2025-06-01", "2025-06-03"));
        block(&mut rn, b, window("2025-06-03", "2025-06-05"));

        assert_eq!(unblock(&mut rn, a, window("2025-06-01", "2025-06-03"), AuditTrail::Keep), 1);
        assert_eq!(rn.unavailable.len(), 1);
        assert_eq!(rn.unavailable[0].booking_id, b);
        assert!(!is_free(&rn, &window("2025-06-04", "2025-06-05")));
    }

    #[test]
    fn unblock_twice_is_a_noop() {
        let mut rn = room();
        let id = Ulid::new();
        let w = window("2025-06-01", "2025-06-03");
        block(&mut rn, id, w);
        unblock(&mut rn, id, w, AuditTrail::Keep);
        assert_eq!(unblock(&mut rn, id, w, AuditTrail::Keep), 0);
    }
}
