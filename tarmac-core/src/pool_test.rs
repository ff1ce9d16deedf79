#[cfg(test)]
mod tests {
    use crate::pool::ResourcePool;
    use crate::types::{AircraftId, RunwayState, StandState};
    use std::time::Duration;

    fn pool(runways: usize, stands: usize) -> ResourcePool {
        ResourcePool::new(runways, stands, Duration::from_secs(5))
    }

    #[test]
    fn test_new_pool_is_all_available() {
        let pool = pool(3, 4);
        let snapshot = pool.snapshot();

        assert_eq!(snapshot.runways.available, 3);
        assert_eq!(snapshot.runways.total(), 3);
        assert_eq!(snapshot.parking_stands.available, 4);
        assert_eq!(snapshot.parking_stands.total(), 4);
        assert_eq!(snapshot.total_runways, 3);
        assert_eq!(snapshot.total_parking_stands, 4);
        assert!(snapshot.is_conserved());
        assert!(pool.runways().iter().all(|r| r.aircraft.is_none()));
        assert!(pool.runways().iter().all(|r| r.operation_duration == Duration::from_secs(5)));
    }

    #[test]
    fn test_reserve_runway_first_fit_until_exhausted() {
        let mut pool = pool(2, 0);
        let first_id = pool.runways()[0].id.clone();
        let second_id = pool.runways()[1].id.clone();
        let a = AircraftId::from("a");
        let b = AircraftId::from("b");

        assert_eq!(pool.reserve_runway(&a), Some(first_id.clone()));
        assert_eq!(pool.reserve_runway(&b), Some(second_id));
        assert_eq!(pool.reserve_runway(&a), None);
        assert_eq!(pool.available_runways(), 0);

        let runway = pool.runway(&first_id).unwrap();
        assert_eq!(runway.state, RunwayState::Reserved);
        assert_eq!(runway.aircraft, Some(a));
    }

    #[test]
    fn test_release_returns_resources_and_clears_aircraft() {
        let mut pool = pool(1, 1);
        let aircraft = AircraftId::from("a");

        let runway = pool.reserve_runway(&aircraft).unwrap();
        let stand = pool.reserve_parking_stand(&aircraft).unwrap();
        assert_eq!(pool.available_parking_stands(), 0);

        assert!(pool.release_runway(&runway));
        assert!(pool.release_parking_stand(&stand));

        assert_eq!(pool.runway(&runway).unwrap().state, RunwayState::Available);
        assert!(pool.runway(&runway).unwrap().aircraft.is_none());
        assert_eq!(pool.parking_stand(&stand).unwrap().state, StandState::Available);
        assert!(pool.parking_stand(&stand).unwrap().aircraft.is_none());
    }

    #[test]
    fn test_release_unknown_ids() {
        let mut pool = pool(1, 1);
        assert!(!pool.release_runway(&"rwy_missing".into()));
        assert!(!pool.release_parking_stand(&"stand_missing".into()));
        assert_eq!(pool.snapshot().runways.available, 1);
    }

    #[test]
    fn test_stand_lookup_by_aircraft_respects_state() {
        let mut pool = pool(0, 2);
        let aircraft = AircraftId::from("a");
        let stand = pool.reserve_parking_stand(&aircraft).unwrap();

        assert!(pool
            .parking_stand_by_aircraft_mut(&aircraft, StandState::Occupied)
            .is_none());

        let found = pool
            .parking_stand_by_aircraft_mut(&aircraft, StandState::Reserved)
            .unwrap();
        assert_eq!(found.id, stand);
        found.state = StandState::Occupied;

        assert!(pool
            .parking_stand_by_aircraft_mut(&AircraftId::from("b"), StandState::Occupied)
            .is_none());
    }

    #[test]
    fn test_snapshot_counts_every_state() {
        let mut pool = pool(3, 3);
        let aircraft = AircraftId::from("a");

        let reserved = pool.reserve_runway(&aircraft).unwrap();
        let operating = pool.reserve_runway(&aircraft).unwrap();
        pool.runway_mut(&operating).unwrap().state = RunwayState::InOperation;
        let _ = pool.reserve_parking_stand(&aircraft).unwrap();
        let occupied = pool.reserve_parking_stand(&aircraft).unwrap();
        pool.parking_stand_mut(&occupied).unwrap().state = StandState::Occupied;

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.runways.available, 1);
        assert_eq!(snapshot.runways.reserved, 1);
        assert_eq!(snapshot.runways.in_operation, 1);
        assert_eq!(snapshot.runways.total(), 3);
        assert_eq!(snapshot.parking_stands.available, 1);
        assert_eq!(snapshot.parking_stands.reserved, 1);
        assert_eq!(snapshot.parking_stands.occupied, 1);
        assert!(snapshot.is_conserved());

        assert!(pool.release_runway(&reserved));
        assert_eq!(pool.snapshot().runways.available, 2);
    }
}
