//! Integration tests on a small deterministic chain environment.
use anyhow::Result;
use tempdir::TempDir;
use uom_core::{
    AgentConfig, Env, FeatureVector, LeaveFeature, OneStep, PolicyConfig, TabularApproximator,
    TemporalOption, UomAgent, UomConfig,
};

/// Chain of `n` states; action 0 steps left, action 1 steps right, both
/// saturating at the ends. Reward 1 on entering the last state.
#[derive(Clone)]
struct ChainConfig {
    n: i64,
}

struct Chain {
    n: i64,
}

impl Env for Chain {
    type Config = ChainConfig;
    type State = i64;

    fn build(config: &ChainConfig, _seed: i64) -> Result<Self> {
        Ok(Self { n: config.n })
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn initial_state(&mut self) -> Result<i64> {
        Ok(0)
    }

    fn take_action(&mut self, state: &i64, action: usize) -> Result<(i64, f32)> {
        let next = match action {
            0 => (*state - 1).max(0),
            _ => (*state + 1).min(self.n - 1),
        };
        let reward = if next == self.n - 1 { 1.0 } else { 0.0 };
        Ok((next, reward))
    }
}

fn one_hot(i: usize, n: usize) -> FeatureVector {
    let mut v = vec![0.0f32; n];
    v[i] = 1.0;
    FeatureVector::from_vec(v)
}

fn build_agent(n: usize) -> UomAgent<TabularApproximator> {
    let config = AgentConfig::default()
        .n_features(n)
        .n_actions(2)
        .policy(PolicyConfig::default().seed(5))
        .uom(UomConfig::default())
        .sample_capacity(64);
    let fa = TabularApproximator::new(n).unwrap();
    let options = vec![
        TemporalOption::build(
            n,
            &PolicyConfig::default().seed(17),
            &UomConfig::default(),
            Box::new(OneStep),
        )
        .unwrap(),
        TemporalOption::build(
            n,
            &PolicyConfig::default().seed(19),
            &UomConfig::default(),
            Box::new(LeaveFeature::new(0, 0.5)),
        )
        .unwrap(),
    ];
    UomAgent::build(&config, fa, options).unwrap()
}

#[test]
fn test_episodes_run_to_budget() {
    let mut agent = build_agent(5);
    let mut env = Chain::build(&ChainConfig { n: 5 }, 0).unwrap();
    for _ in 0..5 {
        let record = agent.run_episode(&mut env, 40).unwrap();
        assert!(record.get_scalar("steps").unwrap() >= 40.0);
        assert!(record.get_scalar("episode_return").unwrap().is_finite());
    }
    assert!(!agent.samples().is_empty());
    assert!(agent.samples().len() <= 64);
}

#[test]
fn test_learned_operators_stay_finite() {
    let mut agent = build_agent(5);
    let mut env = Chain::build(&ChainConfig { n: 5 }, 0).unwrap();
    for _ in 0..10 {
        agent.run_episode(&mut env, 40).unwrap();
    }
    for model in agent.primitive_models() {
        assert!(model.m().max_abs().is_finite());
        assert!(model.u().max_abs().is_finite());
    }
    for opt in agent.options() {
        let phi = one_hot(0, 5);
        // Zero weighting gives exactly zero regardless of learning.
        assert_eq!(opt.expected_return(&[0.0; 5], &phi).unwrap(), 0.0);
        assert!(opt
            .expected_return(&[1.0, -2.0, 0.5, 0.0, 3.0], &phi)
            .unwrap()
            .is_finite());
    }
}

/// The universal property through the option layer: one set of learned
/// operators answers return queries for reward weightings never seen
/// during learning.
#[test]
fn test_option_model_serves_arbitrary_rewards() {
    let n = 4;
    let mut opt = TemporalOption::build(
        n,
        &PolicyConfig::default(),
        &UomConfig::default().alpha(0.5).gamma(0.5),
        Box::new(OneStep),
    )
    .unwrap();
    // Deterministic trajectory 0 -> 1 -> 2, option terminates in 2.
    for _ in 0..200 {
        opt.observe(&one_hot(2, n), &one_hot(3, n), 1.0, true).unwrap();
        opt.observe(&one_hot(1, n), &one_hot(2, n), 0.0, false).unwrap();
        opt.observe(&one_hot(0, n), &one_hot(1, n), 0.0, false).unwrap();
    }

    // Weighting that pays in state 2: value grows toward the goal.
    let toward_goal = [0.0, 0.0, 1.0, 0.0];
    let g0 = opt.expected_return(&toward_goal, &one_hot(0, n)).unwrap();
    let g1 = opt.expected_return(&toward_goal, &one_hot(1, n)).unwrap();
    let g2 = opt.expected_return(&toward_goal, &one_hot(2, n)).unwrap();
    assert!((g2 - 1.0).abs() < 0.05, "got {}", g2);
    assert!((g1 - 0.5).abs() < 0.05, "got {}", g1);
    assert!((g0 - 0.25).abs() < 0.05, "got {}", g0);

    // A second weighting, answered by the same operators without
    // relearning, reverses the ordering.
    let away_from_goal = [1.0, 0.0, 0.0, 0.0];
    let h0 = opt.expected_return(&away_from_goal, &one_hot(0, n)).unwrap();
    let h1 = opt.expected_return(&away_from_goal, &one_hot(1, n)).unwrap();
    let h2 = opt.expected_return(&away_from_goal, &one_hot(2, n)).unwrap();
    assert!((h0 - 1.0).abs() < 0.05, "got {}", h0);
    assert!(h1.abs() < 0.05, "got {}", h1);
    assert!(h2.abs() < 0.05, "got {}", h2);

    // The feature-transition operator reflects the same recursion.
    let acc = opt.next_fv(&one_hot(0, n)).unwrap();
    assert!((acc.get(0) - 1.0).abs() < 0.05);
    assert!((acc.get(1) - 0.5).abs() < 0.05);
    assert!((acc.get(2) - 0.25).abs() < 0.05);
    assert!(acc.get(3).abs() < 0.05);
}

#[test]
fn test_agent_config_yaml_round_trip() {
    let config = AgentConfig::default()
        .n_features(9)
        .n_actions(4)
        .policy(PolicyConfig::default().alpha(0.05).epsilon(0.2))
        .uom(UomConfig::default().gamma(0.95))
        .sample_capacity(256);
    let dir = TempDir::new("uom_agent_config").unwrap();
    let path = dir.path().join("agent.yaml");
    config.save(&path).unwrap();
    let loaded = AgentConfig::load(&path).unwrap();
    assert_eq!(config, loaded);
}
