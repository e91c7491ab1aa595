//! Property tests for the simulation loop.

use armsim::{
    round_to, ArmConfig, ArmSet, Comparison, ComparisonConfig, PolicyConfig, Simulation,
    SimulationConfig,
};
use proptest::prelude::*;

fn arm_set(n: usize) -> ArmSet {
    let arms = (0..n)
        .map(|i| {
            let cfg = match i % 3 {
                0 => ArmConfig::gaussian(0.5 + 0.1 * i as f64, 0.2).unwrap(),
                1 => ArmConfig::uniform(0.0, 1.0 + i as f64).unwrap(),
                _ => ArmConfig::bernoulli(0.4).unwrap(),
            };
            (format!("arm{i}"), cfg)
        })
        .collect();
    ArmSet::new(arms).unwrap()
}

fn policy_strategy() -> impl Strategy<Value = PolicyConfig> {
    prop_oneof![
        (0.0f64..=1.0).prop_map(PolicyConfig::epsilon_greedy),
        (0.05f64..5.0).prop_map(PolicyConfig::softmax),
        (0.0f64..3.0).prop_map(PolicyConfig::ucb),
        Just(PolicyConfig::thompson_sampling()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every series stays round-aligned and pulls are conserved.
    #[test]
    fn ledger_invariants_hold(
        n_arms in 1usize..5,
        policy in policy_strategy(),
        explore in 0usize..40,
        exploit in 0usize..40,
        reward_seed in any::<u64>(),
        policy_seed in any::<u64>(),
    ) {
        let cfg = SimulationConfig::new(arm_set(n_arms), policy)
            .with_seeds(reward_seed, policy_seed);
        let mut sim = Simulation::new(&cfg).unwrap();
        sim.fit(explore).unwrap();
        sim.run(exploit).unwrap();

        let total = explore + exploit;
        let ledger = sim.ledger();
        prop_assert_eq!(ledger.len(), total);
        prop_assert_eq!(sim.rounds().len(), total);
        prop_assert_eq!(sim.expectation_history().len(), total);

        for i in 0..total {
            prop_assert_eq!(ledger.total_pulls_at(i), i as u64 + 1);
        }
        for arm in sim.arms() {
            let s = ledger.series(arm).unwrap();
            prop_assert_eq!(s.len(), total);
            for w in s.pulls_cumulative.windows(2) {
                prop_assert!(w[1] - w[0] <= 1);
            }
            let pulled_rewards: f64 = (0..total)
                .filter(|&i| s.pulled_at(i))
                .map(|i| s.reward_at_round[i])
                .sum();
            prop_assert!((pulled_rewards - s.total_reward()).abs() < 1e-6);
        }
        for rec in sim.rounds() {
            prop_assert!(sim.arms().contains(&rec.arm_id));
            prop_assert_eq!(round_to(rec.reward, 4), rec.reward);
        }
        prop_assert!(sim.expectations().values().all(|e| e.is_finite()));
    }

    /// Same config and seeds give the same trajectory.
    #[test]
    fn runs_are_reproducible(
        policy in policy_strategy(),
        reward_seed in any::<u64>(),
        policy_seed in any::<u64>(),
    ) {
        let cfg = SimulationConfig::new(arm_set(3), policy).with_seeds(reward_seed, policy_seed);
        let mut a = Simulation::new(&cfg).unwrap();
        let mut b = Simulation::new(&cfg).unwrap();
        a.fit(15).unwrap();
        b.fit(15).unwrap();
        a.run(15).unwrap();
        b.run(15).unwrap();
        prop_assert_eq!(a.rounds(), b.rounds());
        prop_assert_eq!(a.expectation_history(), b.expectation_history());
    }

    /// The bandit always spends exactly the baseline's budget.
    #[test]
    fn comparison_budget_matches(
        n_arms in 1usize..4,
        trials in 1usize..30,
        share in 0.01f64..0.99,
    ) {
        let sim = SimulationConfig::new(arm_set(n_arms), PolicyConfig::ucb(1.0));
        let cfg = ComparisonConfig::new(sim, trials).with_exploration_share(share);
        let cmp = Comparison::run(&cfg).unwrap();
        prop_assert_eq!(cmp.explore_rounds + cmp.exploit_rounds, trials * n_arms);
        prop_assert_eq!(cmp.bandit.rounds, trials * n_arms);
        prop_assert_eq!(cmp.ab.total_trials(), trials * n_arms);
    }
}
