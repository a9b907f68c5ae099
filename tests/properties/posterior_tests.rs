use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use tsim::bandit::{Bandit, PriorParams, PullMode, ThompsonSampler};

fn mode() -> impl Strategy<Value = PullMode> {
    prop_oneof![Just(PullMode::Single), Just(PullMode::MonteCarlo)]
}

fn bandit() -> impl Strategy<Value = Bandit> {
    (1usize..6).prop_flat_map(|n| {
        (
            prop::collection::vec(-10.0f64..10.0, n),
            prop::collection::vec(0.0f64..9.0, n),
        )
            .prop_map(|(means, vars)| Bandit::new("prop", means, vars).unwrap())
    })
}

proptest! {
    #[test]
    fn test_update_moves_counts_and_keeps_beta_non_negative(
        mu0 in -100.0f64..100.0,
        n0 in 1.0f64..500.0,
        alpha in 0.5f64..100.0,
        beta in 0.0f64..100.0,
        x in -1000.0f64..1000.0,
    ) {
        let prior = PriorParams::new(mu0, n0, alpha, beta);
        let post = prior.posterior(x);
        prop_assert!((post.n0 - (n0 + 1.0)).abs() < 1e-9);
        prop_assert!((post.alpha - (alpha + 0.5)).abs() < 1e-9);
        prop_assert!(post.beta >= beta);
        prop_assert!(post.is_valid());
        // the new mean lies between the old mean and the observation
        prop_assert!(post.mu0 >= mu0.min(x) - 1e-9 && post.mu0 <= mu0.max(x) + 1e-9);
    }

    #[test]
    fn test_total_pulls_follow_the_schedule(
        mut bandit in bandit(),
        num_rounds in 0usize..80,
        mode in mode(),
        seed in any::<u64>(),
    ) {
        let mut sampler = ThompsonSampler::with_defaults(mode);
        let mut rng = StdRng::seed_from_u64(seed);
        sampler.run(&mut bandit, num_rounds, &mut rng).unwrap();

        let forced = sampler.num_initial_pulls() * bandit.num_arms();
        prop_assert_eq!(bandit.total_pulls(), forced + num_rounds.saturating_sub(forced));
        prop_assert_eq!(bandit.reward_tracker().len(), bandit.total_pulls());
        prop_assert!(sampler.posteriors().iter().all(|p| p.beta >= 0.0 && p.is_valid()));
    }

    #[test]
    fn test_each_step_touches_only_the_chosen_arm(
        mut bandit in bandit(),
        steps in 1usize..20,
        mode in mode(),
        seed in any::<u64>(),
    ) {
        let mut sampler = ThompsonSampler::with_defaults(mode);
        let mut rng = StdRng::seed_from_u64(seed);
        sampler.initialize(&mut bandit, &mut rng).unwrap();

        for _ in 0..steps {
            let before = sampler.posteriors().to_vec();
            let outcome = sampler.step(&mut bandit, &mut rng).unwrap();
            let after = sampler.posteriors();

            for (arm, (old, new)) in before.iter().zip(after).enumerate() {
                if arm == outcome.arm {
                    prop_assert!((new.n0 - old.n0 - 1.0).abs() < 1e-9);
                    prop_assert!((new.alpha - old.alpha - 0.5).abs() < 1e-9);
                } else {
                    prop_assert_eq!(old.mu0.to_bits(), new.mu0.to_bits());
                    prop_assert_eq!(old.n0.to_bits(), new.n0.to_bits());
                    prop_assert_eq!(old.alpha.to_bits(), new.alpha.to_bits());
                    prop_assert_eq!(old.beta.to_bits(), new.beta.to_bits());
                }
            }
        }
    }
}
