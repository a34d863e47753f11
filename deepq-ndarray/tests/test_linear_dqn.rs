use anyhow::Result;
use deepq_core::{
    frame::batch_inputs, Action, Dqn, DqnConfig, Frame, Outcome, StackedInput, Transition,
    ValueFunction,
};
use deepq_ndarray::{opt::OptimizerConfig, LinearQ, LinearQConfig};
use std::fs;
use tempdir::TempDir;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> DqnConfig<LinearQConfig> {
    let model_config = LinearQConfig::default()
        .frame_shape(4, 4)
        .n_outputs(3)
        .opt_config(OptimizerConfig::Adam {
            lr: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        });
    DqnConfig::default()
        .model_config(model_config)
        .legal_actions(vec![Action(0), Action(2)])
        .replay_memory_capacity(100)
        .batch_size(8)
        .target_sync_interval(50)
        .seed(1)
}

fn state() -> StackedInput {
    StackedInput::repeat(Frame::from_vec(4, 4, (0..16).map(|v| v * 16).collect()).unwrap())
}

#[test]
fn test_learns_rewarded_action() -> Result<()> {
    init_logger();
    let mut agent = Dqn::<LinearQ>::build(config())?;

    // One-step episodes: action 0 pays 1, action 2 pays nothing.
    for i in 0..40 {
        let (action, reward) = if i % 2 == 0 {
            (Action(0), 1.0)
        } else {
            (Action(2), 0.0)
        };
        agent.push(Transition::new(state(), action, reward, Outcome::Terminal)?);
    }
    for _ in 0..500 {
        agent.update()?;
    }

    let best = agent.select_action_greedily(&state())?;
    assert_eq!(best.action, Action(0));
    assert!((best.value - 1.0).abs() < 0.2, "value = {}", best.value);
    assert_eq!(agent.target().n_syncs(), 10);
    Ok(())
}

#[test]
fn test_update_bootstraps_from_target() -> Result<()> {
    let mut agent = Dqn::<LinearQ>::build(config().batch_size(1).discount_factor(0.5))?;
    let next = Frame::from_vec(4, 4, vec![0; 16])?;
    agent.push(Transition::new(state(), Action(0), 0.0, Outcome::Continues(next.clone()))?);

    // target = 0.5 * max over legal actions of the snapshot at the successor
    let successor = state().advance(&next)?;
    let q_next = agent.target().forward(&batch_inputs([&successor])?)?;
    let expected = 0.5 * q_next[[0, 0]].max(q_next[[0, 2]]);
    let q = agent.value_function().forward(&batch_inputs([&state()])?)?;
    let expected_loss = 0.5 * (q[[0, 0]] - expected).powi(2);

    let record = agent.update_with_record()?;
    assert!((record.get_scalar("loss")? - expected_loss).abs() < 1e-5);
    assert_eq!(agent.current_iteration(), 1);
    Ok(())
}

#[test]
fn test_persistence_round_trip() -> Result<()> {
    init_logger();
    let dir = TempDir::new("linear_dqn")?;
    let model_path = dir.path().join("model.bin");
    let solver_path = dir.path().join("solver.bin");

    let mut trained = Dqn::<LinearQ>::build(config())?;
    for i in 0..10 {
        let action = trained.select_action(&state(), 1.0)?;
        trained.push(Transition::new(state(), action, i as f32, Outcome::Terminal)?);
    }
    for _ in 0..4 {
        trained.update()?;
    }
    trained.save_trained_model(&model_path)?;
    trained.save_solver(&solver_path)?;

    let mut restored = Dqn::<LinearQ>::build(config())?;
    assert_ne!(restored.value_function().params(), trained.value_function().params());
    restored.load_trained_model(&model_path)?;
    restored.restore_solver(&solver_path)?;
    assert_eq!(restored.value_function().params(), trained.value_function().params());
    assert_eq!(restored.target().params(), trained.value_function().params());
    assert_eq!(restored.current_iteration(), 4);
    assert_eq!(
        restored.select_action_greedily(&state())?,
        trained.select_action_greedily(&state())?
    );
    Ok(())
}

#[test]
fn test_load_errors() -> Result<()> {
    let dir = TempDir::new("linear_dqn_errors")?;
    let mut agent = Dqn::<LinearQ>::build(config())?;
    let before = agent.value_function().params();

    assert!(agent.load_trained_model(dir.path().join("missing.bin")).is_err());

    let corrupt = dir.path().join("corrupt.bin");
    fs::write(&corrupt, b"not a model")?;
    assert!(agent.load_trained_model(&corrupt).is_err());
    assert!(agent.restore_solver(&corrupt).is_err());

    // Parameters saved for another frame size are rejected.
    let other = Dqn::<LinearQ>::build(config().model_config(
        LinearQConfig::default().frame_shape(2, 2).n_outputs(3),
    ))?;
    let other_path = dir.path().join("other.bin");
    other.save_trained_model(&other_path)?;
    assert!(agent.load_trained_model(&other_path).is_err());

    assert_eq!(agent.value_function().params(), before);
    Ok(())
}
