//! Command-line entry point for the audit-desk plan workflow.
//!
//! Each subcommand spawns a plan actor for the addressed plan, executes one
//! command (or reads the current view) and prints the result as JSON.

use anyhow::{anyhow, Result};
use audit_desk::audit_trail::AuditTrailRecorder;
use audit_desk::config::AppConfig;
use audit_desk::domain::{
    create_actor_args, plan_draft, task_draft, ActorId, PlanActor, PlanCommand, PlanMessage,
    PlanView, RawPlanInput, RawTaskInput, RiskLevel, TaskFilter, TaskStatus,
};
use audit_desk::paths;
use clap::{Parser, Subcommand};
use ractor::Actor;
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Parser)]
#[command(name = "auditdesk")]
#[command(about = "Annual audit plan workflow")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new annual plan and print its id.
    CreatePlan {
        #[arg(long)]
        title: String,
        #[arg(long)]
        fiscal_year: i32,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        introduction: Option<String>,
        #[arg(long)]
        total_hours: Option<f64>,
        #[arg(long)]
        planned_task_hours: Option<f64>,
        #[arg(long)]
        advisory_hours: Option<f64>,
        #[arg(long)]
        emergency_hours: Option<f64>,
        #[arg(long)]
        follow_up_hours: Option<f64>,
        #[arg(long)]
        training_hours: Option<f64>,
        #[arg(long)]
        administrative_hours: Option<f64>,
        #[arg(long)]
        budget: Option<f64>,
        #[arg(long)]
        created_by: String,
    },

    /// Add an audit task to a plan.
    AddTask {
        plan_id: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        risk_level: Option<String>,
        #[arg(long)]
        audit_type: Option<String>,
        #[arg(long)]
        objective: Option<String>,
        #[arg(long)]
        quarter: Option<String>,
        #[arg(long)]
        hours: f64,
        #[arg(long)]
        lead_auditor: Option<String>,
    },

    /// Submit a plan for review (moves it to under_review).
    SubmitReview {
        plan_id: String,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long, default_value = "auditor")]
        role: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Wizard submission (moves the plan to submitted).
    Submit {
        plan_id: String,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long, default_value = "auditor")]
        role: String,
    },

    /// Approve a plan.
    Approve {
        plan_id: String,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long, default_value = "audit_manager")]
        role: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Reject a plan back to draft.
    Reject {
        plan_id: String,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long, default_value = "audit_manager")]
        role: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Baseline a plan, locking it permanently.
    Baseline {
        plan_id: String,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long, default_value = "audit_manager")]
        role: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Print the current plan view.
    Show { plan_id: String },

    /// List a plan's tasks, optionally filtered.
    Tasks {
        plan_id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        risk_level: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },

    /// Print a plan's KPIs.
    Kpis { plan_id: String },

    /// Print a plan's capacity profile (persisted or defaults).
    Capacity { plan_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&paths::config_path()?)?;

    match cli.command {
        Command::CreatePlan {
            title,
            fiscal_year,
            version,
            introduction,
            total_hours,
            planned_task_hours,
            advisory_hours,
            emergency_hours,
            follow_up_hours,
            training_hours,
            administrative_hours,
            budget,
            created_by,
        } => {
            let raw = RawPlanInput {
                title: Some(title),
                fiscal_year: Some(fiscal_year),
                version,
                introduction,
                total_available_hours: total_hours,
                planned_task_hours,
                advisory_hours,
                emergency_hours,
                follow_up_hours,
                training_hours,
                administrative_hours,
                estimated_budget: budget,
                created_by: Some(created_by),
            };
            let draft = plan_draft(&raw)?;
            let plan_id = draft.id.to_string();
            let view = dispatch(&plan_id, PlanCommand::CreatePlan { draft }, &config).await?;
            println!("{}", plan_id);
            print_view(&view)?;
        }

        Command::AddTask {
            plan_id,
            code,
            title,
            department,
            risk_level,
            audit_type,
            objective,
            quarter,
            hours,
            lead_auditor,
        } => {
            let raw = RawTaskInput {
                code: Some(code),
                title: Some(title),
                department,
                risk_level,
                audit_type,
                objective,
                planned_quarter: quarter,
                estimated_hours: Some(hours),
                lead_auditor,
                attachments: None,
                status: None,
            };
            let task = task_draft(&raw)?;
            let view = dispatch(&plan_id, PlanCommand::AddTask { task }, &config).await?;
            print_view(&view)?;
        }

        Command::SubmitReview {
            plan_id,
            actor,
            role,
            comment,
        } => {
            let cmd = PlanCommand::SubmitForReview {
                actor: actor.map(ActorId::from),
                role,
                comment,
            };
            print_view(&dispatch(&plan_id, cmd, &config).await?)?;
        }

        Command::Submit {
            plan_id,
            actor,
            role,
        } => {
            let cmd = PlanCommand::Submit {
                actor: actor.map(ActorId::from),
                role,
            };
            print_view(&dispatch(&plan_id, cmd, &config).await?)?;
        }

        Command::Approve {
            plan_id,
            actor,
            role,
            comment,
        } => {
            let cmd = PlanCommand::Approve {
                actor: actor.map(ActorId::from),
                role,
                comment,
            };
            print_view(&dispatch(&plan_id, cmd, &config).await?)?;
        }

        Command::Reject {
            plan_id,
            actor,
            role,
            comment,
        } => {
            let cmd = PlanCommand::Reject {
                actor: actor.map(ActorId::from),
                role,
                comment,
            };
            print_view(&dispatch(&plan_id, cmd, &config).await?)?;
        }

        Command::Baseline {
            plan_id,
            actor,
            role,
            comment,
        } => {
            let cmd = PlanCommand::Baseline {
                actor: actor.map(ActorId::from),
                role,
                comment,
            };
            print_view(&dispatch(&plan_id, cmd, &config).await?)?;
        }

        Command::Show { plan_id } => {
            print_view(&fetch_view(&plan_id, &config).await?)?;
        }

        Command::Tasks {
            plan_id,
            status,
            risk_level,
            text,
        } => {
            let filter = TaskFilter {
                status: status.as_deref().map(parse_task_status).transpose()?,
                risk_level: risk_level.as_deref().map(parse_risk_level).transpose()?,
                text,
            };
            let view = fetch_view(&plan_id, &config).await?;
            println!("{}", serde_json::to_string_pretty(&view.find_tasks(&filter))?);
        }

        Command::Kpis { plan_id } => {
            let view = fetch_view(&plan_id, &config).await?;
            println!("{}", serde_json::to_string_pretty(&view.kpis())?);
        }

        Command::Capacity { plan_id } => {
            let view = fetch_view(&plan_id, &config).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&view.capacity(&config.capacity))?
            );
        }
    }

    Ok(())
}

/// Spawns a plan actor, executes one command and returns the updated view.
async fn dispatch(plan_id: &str, cmd: PlanCommand, config: &AppConfig) -> Result<PlanView> {
    let trail = Arc::new(AuditTrailRecorder::new(&paths::trail_path()?)?);
    let (args, _snapshot_rx, _event_rx) =
        create_actor_args(plan_id, config.snapshot_every, Some(trail))?;

    let (actor_ref, handle) = Actor::spawn(None, PlanActor, args).await?;

    let (tx, rx) = oneshot::channel();
    actor_ref
        .send_message(PlanMessage::Command(Box::new(cmd), tx))
        .map_err(|_| anyhow!("plan actor unavailable"))?;
    let result = rx.await?;

    actor_ref.stop(None);
    let _ = handle.await;

    result.map_err(Into::into)
}

/// Spawns a plan actor and reads the current view without mutating state.
async fn fetch_view(plan_id: &str, config: &AppConfig) -> Result<PlanView> {
    let (args, _snapshot_rx, _event_rx) = create_actor_args(plan_id, config.snapshot_every, None)?;

    let (actor_ref, handle) = Actor::spawn(None, PlanActor, args).await?;

    let (tx, rx) = oneshot::channel();
    actor_ref
        .send_message(PlanMessage::GetView(tx))
        .map_err(|_| anyhow!("plan actor unavailable"))?;
    let view = rx.await?;

    actor_ref.stop(None);
    let _ = handle.await;

    Ok(view)
}

fn print_view(view: &PlanView) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(view)?);
    Ok(())
}

fn parse_task_status(value: &str) -> Result<TaskStatus> {
    match value {
        "not_started" => Ok(TaskStatus::NotStarted),
        "in_progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        "blocked" => Ok(TaskStatus::Blocked),
        other => Err(anyhow!("unknown task status '{}'", other)),
    }
}

fn parse_risk_level(value: &str) -> Result<RiskLevel> {
    match value {
        "low" => Ok(RiskLevel::Low),
        "medium" => Ok(RiskLevel::Medium),
        "high" => Ok(RiskLevel::High),
        other => Err(anyhow!("unknown risk level '{}'", other)),
    }
}
