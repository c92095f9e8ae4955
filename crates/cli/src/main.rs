use clap::{Parser, Subcommand};
use prm_core::config::{data_file_from_env_value, pinned_date_from_env_value};
use prm_core::cohorts::weekday_name;
use prm_core::{
    calculate_health_score, health_icon, with_priority, CoreConfig, HealthLevel, PatientFilter,
    PatientRoster, Priority, QuickView,
};

#[derive(Parser)]
#[command(name = "prm")]
#[command(about = "PRM patient dashboard CLI")]
struct Cli {
    /// Patient dataset (JSON or YAML)
    #[arg(long, global = true, env = "PRM_DATA_FILE")]
    data: Option<String>,
    /// Treat this YYYY-MM-DD date as today
    #[arg(long, global = true, env = "PRM_TODAY")]
    today: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline counts and stage distribution
    Summary,
    /// Health score breakdown for one patient
    Score {
        /// Patient id
        id: String,
    },
    /// Urgent actions, most urgent first
    Actions {
        /// Show at most this many actions
        #[arg(long)]
        limit: Option<usize>,
        /// Only actions at this priority: critical, high, medium or low
        #[arg(long)]
        priority: Option<String>,
    },
    /// Upcoming completions, kit returns and payments
    Events,
    /// List patients through the funnel filters
    List {
        /// Match on name, MRN or id
        #[arg(long)]
        search: Option<String>,
        /// Funnel stage, e.g. "Ramp On"
        #[arg(long)]
        stage: Option<String>,
        /// Two-letter state code
        #[arg(long)]
        state: Option<String>,
        /// Health level, e.g. "Needs Attention"
        #[arg(long)]
        health: Option<String>,
        /// Quick view: urgent, risks, deferrals, payments or healthy
        #[arg(long)]
        view: Option<String>,
        /// Cohort id
        #[arg(long)]
        cohort: Option<String>,
    },
    /// Distinct patient states
    States,
    /// Cohorts with enrolment, plus patients awaiting a cohort
    Cohorts {
        /// Match on cohort id or member name
        #[arg(long)]
        search: Option<String>,
    },
    /// Weekly cohort session schedule
    Schedule,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'prm --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::new(
        data_file_from_env_value(cli.data),
        pinned_date_from_env_value(cli.today)?,
    )?;
    let roster = PatientRoster::from_config(&cfg)?;

    match command {
        Commands::Summary => {
            let summary = roster.summary();
            println!("Dashboard for {}", roster.today());
            println!("Total patients:   {}", summary.total_patients);
            println!("Active patients:  {}", summary.active_patients);
            println!("At risk:          {}", summary.at_risk_patients);
            println!("Unpaid payments:  {}", summary.unpaid_payments);
            println!("Urgent actions:   {}", roster.urgent_actions().len());
            println!();
            for stage in summary.stage_distribution {
                println!("  {:<12} {}", stage.stage.as_str(), stage.count);
            }
        }
        Commands::Score { id } => match roster.health_score(&id) {
            Ok(health) => {
                println!(
                    "{} {} ({}/5, {})",
                    health_icon(health.score),
                    health.level,
                    health.score,
                    health.color.as_str()
                );
                if health.factors.is_empty() {
                    println!("No contributing factors.");
                }
                for factor in health.factors {
                    println!("  {:+} {}", factor.impact, factor.reason);
                }
            }
            Err(e) => eprintln!("Error scoring patient: {}", e),
        },
        Commands::Actions { limit, priority } => {
            let priority = priority.map(|p| p.parse::<Priority>()).transpose()?;
            let actions = roster.urgent_actions();
            let matching: Vec<_> = with_priority(&actions, priority).collect();
            if matching.is_empty() {
                println!("No urgent actions.");
            }
            for action in matching.iter().take(limit.unwrap_or(matching.len())) {
                println!(
                    "[{}] {}: {} - {} ({})",
                    action.priority, action.patient.id, action.message, action.detail, action.action
                );
            }
        }
        Commands::Events => {
            let events = roster.upcoming_events();
            if events.is_empty() {
                println!("No upcoming events.");
            }
            for event in events {
                println!("{:<10} {} - {}", event.date, event.message, event.detail);
            }
        }
        Commands::List {
            search,
            stage,
            state,
            health,
            view,
            cohort,
        } => {
            let filter = PatientFilter {
                search,
                stage: stage.map(Into::into),
                state,
                health: health.map(|h| h.parse::<HealthLevel>()).transpose()?,
                view: view.map(|v| v.parse::<QuickView>()).transpose()?,
                cohort,
            };
            let patients = roster.filter(&filter);
            if patients.is_empty() {
                println!("No patients found.");
            }
            for patient in patients {
                let stage = patient
                    .current_stage
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                println!(
                    "ID: {}, Name: {}, State: {}, Stage: {}, Health: {}",
                    patient.id,
                    patient.name,
                    patient.state.as_deref().unwrap_or("-"),
                    stage,
                    health_icon(calculate_health_score(patient).score)
                );
            }
        }
        Commands::States => {
            for state in roster.states() {
                println!("{}", state);
            }
        }
        Commands::Cohorts { search } => {
            let needle = search.unwrap_or_default();
            let summaries = roster.cohort_summaries();
            let matching: Vec<_> = summaries
                .iter()
                .filter(|c| c.matches_search(&needle))
                .collect();
            println!("{} of {} cohorts", matching.len(), summaries.len());
            for summary in matching {
                let cohort = summary.cohort;
                let size = cohort
                    .size
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".into());
                let fill = summary
                    .fill_percent()
                    .map(|pct| format!(" ({}%)", pct))
                    .unwrap_or_default();
                println!(
                    "{} [{}] {}/{}{}",
                    cohort.id,
                    cohort.cohort_type.as_deref().unwrap_or("-"),
                    summary.enrolled(),
                    size,
                    fill
                );
                println!(
                    "  Live: {} {}  Solo: {} {}",
                    cohort.live_days.as_deref().unwrap_or("-"),
                    cohort.live_time.as_deref().unwrap_or(""),
                    cohort.solo_days.as_deref().unwrap_or("-"),
                    cohort.solo_time.as_deref().unwrap_or("")
                );
                for patient in &summary.patients {
                    println!("    {} {}", patient.id, patient.name);
                }
            }

            let unassigned = roster.unassigned_patients();
            if !unassigned.is_empty() {
                println!();
                println!("Unassigned:");
                for patient in unassigned {
                    println!("    {} {}", patient.id, patient.name);
                }
            }
        }
        Commands::Schedule => {
            for day in roster.weekly_schedule() {
                println!("{}", weekday_name(day.day));
                if day.sessions.is_empty() {
                    println!("  No sessions");
                }
                for session in day.sessions {
                    println!(
                        "  {:<9} {:<5} {} {} ({} patients)",
                        session.time,
                        session.kind.as_str(),
                        session.cohort_id,
                        session.duration,
                        session.patient_count
                    );
                }
            }
        }
    }

    Ok(())
}
