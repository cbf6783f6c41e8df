//! Carerota CLI - command-line client for the care staffing platform.
//!
//! Signs in, switches organizations and drives staff, shift, attendance
//! and temporary-home workflows through the shared query cache.

mod commands;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use carerota_core::utils::CalendarView;
use carerota_core::{AppContext, Config};

use commands::Command;

/// How often unused cache entries are swept
const SWEEP_INTERVAL_SECS: u64 = 30;

/// Directory for an additional daily log file
const LOG_DIR_ENV: &str = "CAREROTA_LOG_DIR";

const USAGE: &str = "\
Usage: carerota <command> [args]

Commands:
  login [email]                     Sign in (CAREROTA_EMAIL / CAREROTA_PASSWORD)
  logout                            End the session
  whoami                            Show the signed-in user and organization
  switch <organization-id>          Act for another organization
  orgs [page]                       Linked organizations
  link-invites                      Pending organization-link invitations
  staff [page] [search]             Staff of the current organization
  invites                           Pending staff invitations
  invite <email> [role]             Invite a staff member (admin|manager|staff)
  accept <token> | decline <token>  Respond to a staff invitation
  revoke <invitation-id>            Revoke a staff invitation
  shifts [day|week|month] [date]    Shift calendar (date as YYYY-MM-DD)
  patterns                          Shift patterns
  assign <date> <shift-id> <user-id>...
  unassign <shift-id> <user-id>
  attendance [day|week|month] [date]
  qr                                Generate a clock-in QR code
  scan <code>                       Clock in or out
  temp-homes                        Temporary homes
  claim <temporary-id> <organization-id>
  unclaim <temporary-id>
  endpoints                         List every API operation and its tags";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`). When
/// `CAREROTA_LOG_DIR` is set a daily file is written there as well; the
/// returned guard flushes it on drop.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "carerota.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args, today()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring unreadable config ({})", e);
        Config::default()
    });
    let ctx = AppContext::from_config(config)?;
    let _sweeper = ctx
        .cache
        .spawn_sweeper(Duration::from_secs(SWEEP_INTERVAL_SECS));
    info!(command = ?command, "Carerota CLI starting");

    if let Err(e) = commands::run(&ctx, command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_page(arg: Option<&String>) -> Result<u64> {
    match arg {
        Some(page) => page
            .parse::<u64>()
            .ok()
            .filter(|p| *p > 0)
            .with_context(|| format!("Invalid page '{}'", page)),
        None => Ok(1),
    }
}

fn parse_date(arg: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(arg, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", arg))
}

/// `[view] [date]`, both optional; defaults to this week.
fn parse_calendar(args: &[String], today: NaiveDate) -> Result<(CalendarView, NaiveDate)> {
    let mut view = CalendarView::Week;
    let mut anchor = today;
    for arg in args {
        if let Some(parsed) = CalendarView::parse(arg) {
            view = parsed;
        } else {
            anchor = parse_date(arg)?;
        }
    }
    Ok((view, anchor))
}

fn required<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a String> {
    args.get(index)
        .with_context(|| format!("Missing {}", what))
}

fn parse_args(args: &[String], today: NaiveDate) -> Result<Command> {
    let Some(name) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];

    let command = match name.as_str() {
        "help" | "-h" | "--help" => Command::Help,
        "login" => Command::Login {
            email: rest.first().cloned(),
        },
        "logout" => Command::Logout,
        "whoami" => Command::WhoAmI,
        "switch" => Command::Switch {
            organization_id: required(rest, 0, "organization id")?.clone(),
        },
        "orgs" => Command::Organizations {
            page: parse_page(rest.first())?,
        },
        "link-invites" => Command::LinkInvitations,
        "staff" => Command::Staff {
            page: parse_page(rest.first())?,
            search: rest.get(1).cloned(),
        },
        "invites" => Command::StaffInvitations,
        "invite" => Command::Invite {
            email: required(rest, 0, "email")?.clone(),
            role: rest.get(1).cloned().unwrap_or_else(|| "staff".to_string()),
        },
        "accept" => Command::Accept {
            token: required(rest, 0, "invitation token")?.clone(),
        },
        "decline" => Command::Decline {
            token: required(rest, 0, "invitation token")?.clone(),
        },
        "revoke" => Command::Revoke {
            invitation_id: required(rest, 0, "invitation id")?.clone(),
        },
        "shifts" => {
            let (view, anchor) = parse_calendar(rest, today)?;
            Command::Shifts { view, anchor }
        }
        "patterns" => Command::Patterns,
        "assign" => {
            let date = parse_date(required(rest, 0, "shift date")?)?;
            let shift_id = required(rest, 1, "shift id")?.clone();
            let user_ids: Vec<String> = rest[2..].to_vec();
            if user_ids.is_empty() {
                bail!("Missing user id");
            }
            Command::Assign {
                date,
                shift_id,
                user_ids,
            }
        }
        "unassign" => Command::Unassign {
            shift_id: required(rest, 0, "shift id")?.clone(),
            user_id: required(rest, 1, "user id")?.clone(),
        },
        "attendance" => {
            let (view, anchor) = parse_calendar(rest, today)?;
            Command::Attendance { view, anchor }
        }
        "qr" => Command::Qr,
        "scan" => Command::Scan {
            code: required(rest, 0, "code")?.clone(),
        },
        "temp-homes" => Command::TemporaryHomes,
        "claim" => Command::Claim {
            temporary_id: required(rest, 0, "temporary id")?.clone(),
            organization_id: required(rest, 1, "organization id")?.clone(),
        },
        "unclaim" => Command::Unclaim {
            temporary_id: required(rest, 0, "temporary id")?.clone(),
        },
        "endpoints" => Command::Endpoints,
        other => bail!("Unknown command '{}'", other),
    };
    Ok(command)
}

pub(crate) fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub(crate) fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_no_args_is_help() {
        assert_eq!(parse_args(&[], date(2026, 3, 4)).expect("parse"), Command::Help);
    }

    #[test]
    fn test_calendar_defaults_to_this_week() {
        let today = date(2026, 3, 4);
        assert_eq!(
            parse_args(&args("shifts"), today).expect("parse"),
            Command::Shifts {
                view: CalendarView::Week,
                anchor: today
            }
        );
        assert_eq!(
            parse_args(&args("attendance month 2026-04-10"), today).expect("parse"),
            Command::Attendance {
                view: CalendarView::Month,
                anchor: date(2026, 4, 10)
            }
        );
        assert!(parse_args(&args("shifts 10/04/2026"), today).is_err());
    }

    #[test]
    fn test_assign_needs_users() {
        let today = date(2026, 3, 4);
        assert!(parse_args(&args("assign 2026-03-04 s1"), today).is_err());
        assert_eq!(
            parse_args(&args("assign 2026-03-04 s1 u1 u2"), today).expect("parse"),
            Command::Assign {
                date: today,
                shift_id: "s1".to_string(),
                user_ids: vec!["u1".to_string(), "u2".to_string()],
            }
        );
    }

    #[test]
    fn test_pages_are_positive() {
        let today = date(2026, 3, 4);
        assert_eq!(
            parse_args(&args("orgs 3"), today).expect("parse"),
            Command::Organizations { page: 3 }
        );
        assert!(parse_args(&args("orgs 0"), today).is_err());
        assert!(parse_args(&args("staff two"), today).is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_args(&args("frobnicate"), date(2026, 3, 4)).is_err());
    }
}
