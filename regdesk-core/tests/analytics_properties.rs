use proptest::prelude::*;
use regdesk_core::{RegistrationAnalytics, DEFAULT_POPULAR_LIMIT};

#[derive(Debug, Clone)]
struct Attempt {
    course: String,
    success: bool,
    queue_time: Option<f64>,
}

fn arb_attempt() -> impl Strategy<Value = Attempt> {
    (
        prop::sample::select(vec!["CS101", "MA201", "PH110", "EN050"]),
        any::<bool>(),
        prop::option::of(0.0f64..600.0),
    )
        .prop_map(|(course, success, queue_time)| Attempt {
            course: course.to_string(),
            success,
            queue_time,
        })
}

proptest! {
    /// Property: after N attempts the counters balance and total == N
    #[test]
    fn prop_counters_balance(attempts in prop::collection::vec(arb_attempt(), 0..200)) {
        let mut analytics = RegistrationAnalytics::new();
        for a in &attempts {
            analytics.track_registration_attempt(&a.course, a.success, a.queue_time, None);
        }

        let m = analytics.registration_metrics();
        prop_assert_eq!(m.total_attempts, attempts.len() as u64);
        prop_assert_eq!(m.total_attempts, m.successful_registrations + m.failed_registrations);
        prop_assert_eq!(analytics.registration_history(None, None).count(), attempts.len());
    }

    /// Property: success rate is 0 on empty, else 100 * ok / total
    #[test]
    fn prop_success_rate(outcomes in prop::collection::vec(any::<bool>(), 0..100)) {
        let mut analytics = RegistrationAnalytics::new();
        for ok in &outcomes {
            analytics.track_registration_attempt("CS101", *ok, None, None);
        }

        let ok = outcomes.iter().filter(|o| **o).count() as f64;
        let expected = if outcomes.is_empty() { 0.0 } else { ok / outcomes.len() as f64 * 100.0 };
        prop_assert!((analytics.success_rate() - expected).abs() < 1e-9);
    }

    /// Property: session counter never goes below zero and peak bounds current
    #[test]
    fn prop_sessions_floor(events in prop::collection::vec(any::<bool>(), 0..200)) {
        let mut analytics = RegistrationAnalytics::new();
        let mut expected: u64 = 0;
        let mut peak: u64 = 0;
        for active in &events {
            analytics.track_user_session(*active);
            expected = if *active { expected + 1 } else { expected.saturating_sub(1) };
            peak = peak.max(expected);
        }

        let load = analytics.current_load();
        prop_assert_eq!(load.current_users, expected);
        prop_assert_eq!(load.peak_users, peak);
        prop_assert!(load.peak_users >= load.current_users);
        prop_assert!(load.load_percentage >= 0.0 && load.load_percentage <= 100.0);
    }

    /// Property: K activations without deactivation yield current == K
    #[test]
    fn prop_k_sessions(k in 0u64..100) {
        let mut analytics = RegistrationAnalytics::new();
        for _ in 0..k {
            analytics.track_user_session(true);
        }
        let load = analytics.current_load();
        prop_assert_eq!(load.current_users, k);
        prop_assert!(load.peak_users >= k);
    }

    /// Property: time-slot view is always sorted descending by count
    #[test]
    fn prop_time_slots_sorted(slots in prop::collection::vec("(08|09|10|11|14):00", 1..100)) {
        let mut analytics = RegistrationAnalytics::new();
        for slot in &slots {
            analytics.update_time_slot_popularity(slot);
        }

        let view = analytics.popular_time_slots(usize::MAX);
        prop_assert!(view.windows(2).all(|w| w[0].count >= w[1].count));
        prop_assert_eq!(view.iter().map(|s| s.count).sum::<u64>(), slots.len() as u64);
        prop_assert!(analytics.popular_time_slots(DEFAULT_POPULAR_LIMIT).len() <= DEFAULT_POPULAR_LIMIT);
    }

    /// Property: clear always restores the fresh state
    #[test]
    fn prop_clear_resets(attempts in prop::collection::vec(arb_attempt(), 0..50)) {
        let mut analytics = RegistrationAnalytics::new();
        for a in &attempts {
            analytics.track_registration_attempt(&a.course, a.success, a.queue_time, Some("x"));
            analytics.track_user_session(a.success);
            analytics.update_time_slot_popularity(&a.course);
        }
        analytics.clear_metrics();

        let fresh = RegistrationAnalytics::new();
        prop_assert_eq!(analytics.registration_metrics(), fresh.registration_metrics());
        prop_assert_eq!(analytics.current_load(), fresh.current_load());
        prop_assert_eq!(analytics.registration_history(None, None).count(), 0);
    }
}
