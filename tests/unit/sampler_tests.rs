use rand::SeedableRng;
use rand::rngs::StdRng;

use tsim::bandit::{
    ArmPull, Bandit, PriorParams, PropensityPolicy, PullMode, SamplerConfig, SoftmaxPropensity,
    ThompsonSampler, WinRatePropensity, argmax, thompson_arm_pull, thompson_sampling,
};
use tsim::test_utils::fixtures::{default_sampler, demo_bandit};

#[test]
fn seeded_priors_follow_initial_averages() {
    let mut bandit = demo_bandit();
    let mut sampler = default_sampler(PullMode::Single);
    let mut rng = StdRng::seed_from_u64(17);
    sampler.initialize(&mut bandit, &mut rng).unwrap();

    assert_eq!(bandit.total_pulls(), 15);
    for (arm, prior) in sampler.posteriors().iter().enumerate() {
        assert_eq!(prior.mu0.to_bits(), bandit.avg_reward_tracker()[arm].to_bits());
        assert!((prior.n0 - 5.0).abs() < f64::EPSILON);
        assert!((prior.alpha - 0.5).abs() < f64::EPSILON);
        assert!((prior.beta - 0.5).abs() < f64::EPSILON);
    }
}

#[test]
fn forced_pulls_go_round_robin() {
    let mut bandit = demo_bandit();
    let mut sampler = default_sampler(PullMode::Single);
    let mut rng = StdRng::seed_from_u64(2);
    sampler.initialize(&mut bandit, &mut rng).unwrap();

    let arms: Vec<usize> = bandit.pulls().iter().map(|p| p.arm).collect();
    let expected: Vec<usize> = (0..5).flat_map(|_| 0..3).collect();
    assert_eq!(arms, expected);
}

#[test]
fn step_reads_the_newest_reward() {
    let mut bandit = demo_bandit();
    let mut sampler = default_sampler(PullMode::MonteCarlo);
    let mut rng = StdRng::seed_from_u64(23);
    sampler.initialize(&mut bandit, &mut rng).unwrap();

    let outcome = sampler.step(&mut bandit, &mut rng).unwrap();
    assert_eq!(bandit.last_reward(), Some(outcome.reward));
    assert_eq!(bandit.reward_tracker().last().copied(), Some(outcome.reward));
    assert_eq!(outcome.posterior, outcome.prior.posterior(outcome.reward));

    let propensities = outcome.propensities.unwrap();
    assert_eq!(propensities.len(), 3);
    assert_eq!(bandit.pulls().last().unwrap().propensity, Some(propensities[outcome.arm]));
}

#[test]
fn step_before_initialize_is_rejected() {
    let mut bandit = demo_bandit();
    let mut sampler = default_sampler(PullMode::Single);
    let mut rng = StdRng::seed_from_u64(0);
    assert!(sampler.step(&mut bandit, &mut rng).is_err());
    assert_eq!(bandit.total_pulls(), 0);
}

#[test]
fn convenience_entry_point_returns_final_posteriors() {
    let mut bandit = demo_bandit();
    let mut rng = StdRng::seed_from_u64(99);
    let posteriors = thompson_sampling(&mut bandit, 100, PullMode::Single, &mut rng).unwrap();

    assert_eq!(posteriors.len(), 3);
    assert_eq!(bandit.total_pulls(), 100);
    let n0_total: f64 = posteriors.iter().map(|p| p.n0).sum();
    assert!((n0_total - 100.0).abs() < 1e-9);
}

#[test]
fn custom_prior_shape_is_used_for_seeding() {
    let config = SamplerConfig {
        initial_pull_alpha: 1,
        prior_alpha: 2.0,
        prior_beta: 3.0,
        ..SamplerConfig::default()
    };
    let mut sampler = ThompsonSampler::new(
        config,
        PullMode::Single,
        Box::new(SoftmaxPropensity::default()),
    )
    .unwrap();
    let mut bandit = Bandit::new("pair", vec![0.0, 1.0], vec![1.0, 1.0]).unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    sampler.run(&mut bandit, 10, &mut rng).unwrap();

    // 3 - 2 * 1 = 1 is below the floor of 2
    assert_eq!(sampler.num_initial_pulls(), 2);
    assert_eq!(bandit.total_pulls(), 10);
    let alpha_total: f64 = sampler.posteriors().iter().map(|p| p.alpha).sum();
    assert!((alpha_total - (2.0 * 2.0 + 6.0 * 0.5)).abs() < 1e-12);
}

#[test]
fn invalid_sampler_config_is_rejected() {
    let config = SamplerConfig {
        prior_beta: -1.0,
        ..SamplerConfig::default()
    };
    let result = ThompsonSampler::new(
        config,
        PullMode::Single,
        Box::new(SoftmaxPropensity::default()),
    );
    assert!(result.is_err());
}

#[test]
fn single_pull_breaks_ties_toward_lowest_index() {
    let mut rng = StdRng::seed_from_u64(1);
    let pull = thompson_arm_pull(
        &[0.5, 2.0, 2.0, 1.0],
        &[1.0; 4],
        PullMode::Single,
        &SoftmaxPropensity::default(),
        &mut rng,
    )
    .unwrap();
    assert_eq!(pull, ArmPull::Single(1));
    assert_eq!(argmax(&[f64::NAN, -1.0]), Some(1));
    assert_eq!(argmax(&[]), None);
}

#[test]
fn win_rate_prefers_the_clear_leader() {
    let mut rng = StdRng::seed_from_u64(8);
    let policy = WinRatePropensity { samples: 2000 };
    let propensities = policy
        .propensities(&[0.0, 10.0], &[0.01, 0.01], &mut rng)
        .unwrap();
    assert!(propensities[1] > 0.99);
    assert!(propensities[0] > 0.0);
}

#[test]
fn mismatched_selection_inputs_are_rejected() {
    let mut rng = StdRng::seed_from_u64(1);
    let result = thompson_arm_pull(
        &[0.0, 1.0],
        &[1.0],
        PullMode::MonteCarlo,
        &SoftmaxPropensity::default(),
        &mut rng,
    );
    assert!(result.is_err());
}

#[test]
fn posterior_update_matches_closed_form() {
    let prior = PriorParams::new(1.0, 4.0, 0.5, 0.5);
    let post = prior.posterior(3.0);
    assert!((post.n0 - 5.0).abs() < 1e-12);
    assert!((post.alpha - 1.0).abs() < 1e-12);
    assert!((post.mu0 - 7.0 / 5.0).abs() < 1e-12);
    assert!((post.beta - (0.5 + 0.5 * 0.8 * 4.0)).abs() < 1e-12);
}
