mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use agent_swarm::agent::{Agent, AgentDirectory};
use agent_swarm::error::SwarmError;
use agent_swarm::types::GenerationParams;
use agent_swarm::workflow::{
    Chain, EvaluatorOptimizer, Orchestrator, Parallel, Planner, Rating, Router, Workflow, WorkflowAgent,
};

use common::{directory, ScriptedModel, StubDelegate};

fn workflow_agent(workflow: Workflow, agents: &AgentDirectory) -> WorkflowAgent {
    let mut agent = WorkflowAgent::new("coordinator", "coordinates", None, workflow);
    agent.attach_agents(agents).unwrap();
    agent
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn evaluation(rating: &str, needs_improvement: bool, feedback: &str) -> String {
    json!({
        "rating": rating,
        "feedback": feedback,
        "needs_improvement": needs_improvement,
        "focus_areas": ["clarity"],
    })
    .to_string()
}

#[tokio::test]
async fn chain_returns_the_last_output() {
    let (a, b, c) = (
        StubDelegate::fixed("a", "A"),
        StubDelegate::fixed("b", "B"),
        StubDelegate::fixed("c", "C"),
    );
    let dir = directory(&[a.clone(), b.clone(), c.clone()]);
    let agent = workflow_agent(Workflow::Chain(Chain::new(names(&["a", "b", "c"]), false)), &dir);

    assert_eq!(agent.handle("start").await.unwrap(), "C");
    assert_eq!(b.received(), vec!["A"]);
    assert_eq!(c.received(), vec!["B"]);
}

#[tokio::test]
async fn cumulative_chain_sees_request_and_prior_outputs() {
    let (a, b) = (StubDelegate::fixed("a", "A"), StubDelegate::fixed("b", "B"));
    let dir = directory(&[a.clone(), b.clone()]);
    let agent = workflow_agent(Workflow::Chain(Chain::new(names(&["a", "b"]), true)), &dir);

    assert_eq!(agent.handle("start").await.unwrap(), "B");
    assert_eq!(b.received(), vec!["start\n\nA"]);
}

#[tokio::test]
async fn chain_aborts_on_delegation_failure() {
    let a = StubDelegate::new("a", |_| Err(SwarmError::transport("agent", "a", "refused")));
    let b = StubDelegate::fixed("b", "B");
    let dir = directory(&[a.clone(), b.clone()]);
    let agent = workflow_agent(Workflow::Chain(Chain::new(names(&["a", "b"]), false)), &dir);

    let err = agent.handle("start").await.unwrap_err();
    assert!(matches!(err, SwarmError::Agent { ref agent, .. } if agent == "coordinator"));
    assert_eq!(b.call_count(), 0);
}

#[tokio::test]
async fn attaching_unknown_or_self_agents_fails() {
    let dir = directory(&[StubDelegate::fixed("a", "A")]);

    let mut unknown = WorkflowAgent::new(
        "coordinator",
        "",
        None,
        Workflow::Chain(Chain::new(names(&["a", "ghost"]), false)),
    );
    assert!(unknown.attach_agents(&dir).is_err());

    let mut selfish = WorkflowAgent::new(
        "coordinator",
        "",
        None,
        Workflow::Parallel(Parallel::new(names(&["a", "coordinator"]), None)),
    );
    assert!(matches!(
        selfish.attach_agents(&dir),
        Err(SwarmError::Configuration(_))
    ));
}

#[tokio::test]
async fn parallel_concatenates_every_branch() {
    let (x, y) = (StubDelegate::fixed("x", "1"), StubDelegate::fixed("y", "2"));
    let dir = directory(&[x, y]);
    let agent = workflow_agent(Workflow::Parallel(Parallel::new(names(&["x", "y"]), None)), &dir);

    let reply = agent.handle("go").await.unwrap();
    assert_eq!(reply, "x:\n1\n\ny:\n2");
}

#[tokio::test]
async fn parallel_fan_in_receives_the_concatenation() {
    let (x, y) = (StubDelegate::fixed("x", "1"), StubDelegate::fixed("y", "2"));
    let merge = StubDelegate::fixed("merge", "merged");
    let dir = directory(&[x, y, merge.clone()]);
    let agent = workflow_agent(
        Workflow::Parallel(Parallel::new(names(&["x", "y"]), Some("merge".into()))),
        &dir,
    );

    assert_eq!(agent.handle("go").await.unwrap(), "merged");
    let received = merge.received();
    assert!(received[0].contains('1') && received[0].contains('2'));
}

#[tokio::test]
async fn parallel_returns_first_failure_in_listed_order() {
    let x = StubDelegate::new("x", |_| Err(SwarmError::InvalidState("x broke".into())));
    let y = StubDelegate::new("y", |_| Err(SwarmError::InvalidState("y broke".into())));
    let dir = directory(&[x, y.clone()]);
    let agent = workflow_agent(Workflow::Parallel(Parallel::new(names(&["x", "y"]), None)), &dir);

    let err = agent.handle("go").await.unwrap_err();
    assert!(err.to_string().contains("x broke"), "got {err}");
    assert_eq!(y.call_count(), 1);
}

#[tokio::test]
async fn evaluator_satisfied_first_time_calls_generator_once() {
    let generator = StubDelegate::fixed("writer", "draft");
    let evaluator = StubDelegate::fixed("critic", &evaluation("good", false, "fine"));
    let dir = directory(&[generator.clone(), evaluator.clone()]);
    let agent = workflow_agent(
        Workflow::EvaluatorOptimizer(EvaluatorOptimizer::new("writer", "critic", 3, None)),
        &dir,
    );

    assert_eq!(agent.handle("write").await.unwrap(), "draft");
    assert_eq!(generator.call_count(), 1);
    assert_eq!(evaluator.call_count(), 1);
}

#[tokio::test]
async fn evaluator_feedback_is_fed_back_until_min_rating() {
    let generator = StubDelegate::sequence("writer", names(&["v1", "v2", "v3"]));
    let evaluator = StubDelegate::sequence(
        "critic",
        vec![
            evaluation("poor", true, "too vague"),
            format!("```json\n{}\n```", evaluation("excelent", true, "nearly")),
        ],
    );
    let dir = directory(&[generator.clone(), evaluator]);
    let agent = workflow_agent(
        Workflow::EvaluatorOptimizer(EvaluatorOptimizer::new("writer", "critic", 5, Some(Rating::Good))),
        &dir,
    );

    assert_eq!(agent.handle("write").await.unwrap(), "v2");
    let prompts = generator.received();
    assert_eq!(prompts[0], "write");
    assert!(prompts[1].starts_with("write") && prompts[1].contains("too vague"));
    assert!(prompts[1].contains("- clarity"));
}

#[tokio::test]
async fn evaluator_returns_best_candidate_at_the_cap() {
    let generator = StubDelegate::sequence("writer", names(&["v1", "v2", "v3"]));
    let evaluator = StubDelegate::sequence(
        "critic",
        vec![
            evaluation("fair", true, "a"),
            evaluation("good", true, "b"),
            evaluation("fair", true, "c"),
        ],
    );
    let dir = directory(&[generator.clone(), evaluator]);
    let agent = workflow_agent(
        Workflow::EvaluatorOptimizer(EvaluatorOptimizer::new("writer", "critic", 2, None)),
        &dir,
    );

    assert_eq!(agent.handle("write").await.unwrap(), "v2");
    assert_eq!(generator.call_count(), 3);
}

#[tokio::test]
async fn zero_refinements_keeps_the_first_draft() {
    let generator = StubDelegate::sequence("writer", names(&["v1", "v2"]));
    let evaluator = StubDelegate::fixed("critic", &evaluation("poor", true, "redo"));
    let dir = directory(&[generator.clone(), evaluator.clone()]);
    let agent = workflow_agent(
        Workflow::EvaluatorOptimizer(EvaluatorOptimizer::new("writer", "critic", 0, None)),
        &dir,
    );

    assert_eq!(agent.handle("write").await.unwrap(), "v1");
    assert_eq!(generator.call_count(), 1);
    assert_eq!(evaluator.call_count(), 1);
}

#[tokio::test]
async fn unparseable_evaluation_is_a_decoding_error() {
    let dir = directory(&[
        StubDelegate::fixed("writer", "draft"),
        StubDelegate::fixed("critic", "looks great to me"),
    ]);
    let agent = workflow_agent(
        Workflow::EvaluatorOptimizer(EvaluatorOptimizer::new("writer", "critic", 3, None)),
        &dir,
    );

    match agent.handle("write").await.unwrap_err() {
        SwarmError::Agent { source, .. } => assert!(matches!(*source, SwarmError::Decoding { .. })),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn router_runs_steps_in_order_with_concurrent_tasks() {
    let (research, write) = (
        StubDelegate::fixed("research", "facts"),
        StubDelegate::fixed("write", "essay"),
    );
    let plan = json!({
        "steps": [
            {"description": "gather", "tasks": [{"description": "find facts", "agent": "research"}]},
            {"description": "draft", "tasks": [{"description": "write it up", "agent": "write"}]}
        ],
        "is_complete": false
    });
    let model = ScriptedModel::default().with_structured(vec![plan]);
    let requests = model.request_log();
    let planner = Planner::new(Box::new(model), "", GenerationParams::default());
    let dir = directory(&[research.clone(), write.clone()]);
    let agent = workflow_agent(
        Workflow::Router(Router::new(planner, names(&["research", "write"]))),
        &dir,
    );

    let reply = agent.handle("essay on rust").await.unwrap();
    assert_eq!(reply, "research:\nfacts\n\nwrite:\nessay");
    assert_eq!(research.received(), vec!["find facts"]);

    let instructions = requests.lock().unwrap()[0].instructions.clone();
    assert!(instructions.contains("- research: research agent"));
}

#[tokio::test]
async fn router_plan_with_unknown_agent_is_a_decoding_error() {
    let plan = json!({
        "steps": [{"description": "s", "tasks": [{"description": "t", "agent": "ghost"}]}],
        "is_complete": false
    });
    let planner = Planner::new(
        Box::new(ScriptedModel::default().with_structured(vec![plan])),
        "",
        GenerationParams::default(),
    );
    let worker = StubDelegate::fixed("worker", "w");
    let dir = directory(&[worker.clone()]);
    let agent = workflow_agent(Workflow::Router(Router::new(planner, names(&["worker"]))), &dir);

    match agent.handle("do it").await.unwrap_err() {
        SwarmError::Agent { source, .. } => assert!(matches!(*source, SwarmError::Decoding { .. })),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(worker.call_count(), 0);
}

#[tokio::test]
async fn orchestrator_replans_until_complete() {
    let step = |agent: &str| {
        json!({
            "steps": [
                {"description": "next", "tasks": [{"description": format!("{agent} task"), "agent": agent}]},
                {"description": "later", "tasks": [{"description": "unused", "agent": "b"}]}
            ],
            "is_complete": false
        })
    };
    let done = json!({"steps": [], "is_complete": true});
    let model = ScriptedModel::default().with_structured(vec![step("a"), step("b"), done]);
    let requests = model.request_log();
    let planner = Planner::new(Box::new(model), "", GenerationParams::default());
    let (a, b) = (StubDelegate::fixed("a", "first"), StubDelegate::fixed("b", "second"));
    let dir = directory(&[a.clone(), b.clone()]);
    let agent = workflow_agent(
        Workflow::Orchestrator(Orchestrator::new(planner, names(&["a", "b"]), 10)),
        &dir,
    );

    let reply = agent.handle("goal").await.unwrap();
    assert_eq!(reply, "a:\nfirst\n\nb:\nsecond");
    assert_eq!(a.call_count(), 1);
    assert_eq!(b.call_count(), 1);

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[2].messages[0].text().contains("second"));
}

#[tokio::test]
async fn orchestrator_stops_at_the_round_cap() {
    let step = json!({
        "steps": [{"description": "again", "tasks": [{"description": "more", "agent": "a"}]}],
        "is_complete": false
    });
    let model = ScriptedModel::default().with_structured(vec![step.clone(), step.clone(), step]);
    let planner = Planner::new(Box::new(model), "", GenerationParams::default());
    let a = StubDelegate::fixed("a", "x");
    let dir = directory(&[a.clone()]);
    let agent = workflow_agent(Workflow::Orchestrator(Orchestrator::new(planner, names(&["a"]), 2)), &dir);

    agent.handle("goal").await.unwrap();
    assert_eq!(a.call_count(), 2);
}

#[test]
fn workflow_card_lists_sub_agents() {
    let agent = WorkflowAgent::new(
        "pipeline",
        "two step pipeline",
        None,
        Workflow::Chain(Chain::new(names(&["a", "b"]), false)),
    );
    let card = agent.card();
    assert_eq!(card.skills.len(), 1);
    assert_eq!(card.skills[0].id, "chain");
    assert_eq!(card.skills[0].tags, names(&["a", "b"]));
}
