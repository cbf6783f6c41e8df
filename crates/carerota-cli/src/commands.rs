//! Command execution. Every command goes through the shared query cache so
//! writes invalidate the reads they affect.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use tracing::warn;

use carerota_core::models::{Invitation, StaffRole};
use carerota_core::registry::attendance::{GenerateQrCode, ListAttendance, ScanQrCode, ScanQrCodeArgs};
use carerota_core::registry::organization::{
    ClaimTemporaryHome, ClaimTemporaryHomeArgs, LinkedOrganizationsArgs, ListLinkInvitations,
    ListLinkedOrganizations, ListTemporaryHomes, UnclaimTemporaryHome,
};
use carerota_core::registry::shifts::{
    AssignStaff, AssignStaffArgs, ListShiftPatterns, ListShifts, UnassignStaff, UnassignStaffArgs,
};
use carerota_core::registry::staff::{
    AcceptStaffInvitation, DeclineStaffInvitation, InviteStaffArgs, InviteStaff, ListStaff,
    ListStaffArgs, ListStaffInvitations, RevokeStaffInvitation,
};
use carerota_core::registry::{catalog, OperationKind};
use carerota_core::utils::{format_date, format_phone, truncate_string, CalendarView, DateRange};
use carerota_core::AppContext;

use crate::{prompt, prompt_password};

/// Env var holding the login email
const EMAIL_ENV: &str = "CAREROTA_EMAIL";

/// Env var holding the login password
const PASSWORD_ENV: &str = "CAREROTA_PASSWORD";

/// Column width for names in listings
const NAME_WIDTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login { email: Option<String> },
    Logout,
    WhoAmI,
    Switch { organization_id: String },
    Organizations { page: u64 },
    LinkInvitations,
    Staff { page: u64, search: Option<String> },
    StaffInvitations,
    Invite { email: String, role: String },
    Accept { token: String },
    Decline { token: String },
    Revoke { invitation_id: String },
    Shifts { view: CalendarView, anchor: NaiveDate },
    Patterns,
    Assign { date: NaiveDate, shift_id: String, user_ids: Vec<String> },
    Unassign { shift_id: String, user_id: String },
    Attendance { view: CalendarView, anchor: NaiveDate },
    Qr,
    Scan { code: String },
    TemporaryHomes,
    Claim { temporary_id: String, organization_id: String },
    Unclaim { temporary_id: String },
    Endpoints,
}

impl Command {
    fn needs_session(&self) -> bool {
        !matches!(
            self,
            Command::Help | Command::Login { .. } | Command::Logout | Command::Endpoints
        )
    }
}

pub async fn run(ctx: &AppContext, command: Command) -> Result<()> {
    if command.needs_session() && !ctx.is_authenticated() {
        bail!("Not signed in. Run `carerota login` first.");
    }

    match command {
        Command::Help => {}
        Command::Login { email } => login(ctx, email).await?,
        Command::Logout => {
            ctx.logout();
            println!("Signed out.");
        }
        Command::WhoAmI => whoami(ctx).await?,
        Command::Switch { organization_id } => {
            let state = ctx.switch_organization(&organization_id).await?;
            match state.current_organization {
                Some(org) => println!("Now acting for {} ({})", org.name, org.id),
                None => println!("Switched organization."),
            }
        }
        Command::Organizations { page } => organizations(ctx, page).await?,
        Command::LinkInvitations => {
            let invitations = ctx.cache.query::<ListLinkInvitations>(()).await?;
            print_invitations(&invitations);
        }
        Command::Staff { page, search } => staff(ctx, page, search).await?,
        Command::StaffInvitations => {
            let invitations = ctx.cache.query::<ListStaffInvitations>(()).await?;
            print_invitations(&invitations);
        }
        Command::Invite { email, role } => {
            let role = parse_role(&role)?;
            let invitation = ctx
                .cache
                .mutate::<InviteStaff>(&InviteStaffArgs {
                    email,
                    role,
                    staff_type: None,
                })
                .await?;
            println!(
                "Invitation {} sent, expires {}",
                invitation.id,
                invitation.expires_at.with_timezone(&Local).format("%d %b %Y %H:%M")
            );
        }
        Command::Accept { token } => {
            let membership = ctx.cache.mutate::<AcceptStaffInvitation>(&token).await?;
            println!(
                "Joined organization {} as {}",
                membership.organization_id,
                membership.role.display_name()
            );
            // Membership changes what the profile grants
            if let Err(e) = ctx.load_profile().await {
                warn!(error = %e, "Failed to reload profile");
            }
        }
        Command::Decline { token } => {
            let message = ctx.cache.mutate::<DeclineStaffInvitation>(&token).await?;
            println!("{}", message.unwrap_or_else(|| "Invitation declined.".to_string()));
        }
        Command::Revoke { invitation_id } => {
            let message = ctx
                .cache
                .mutate::<RevokeStaffInvitation>(&invitation_id)
                .await?;
            println!("{}", message.unwrap_or_else(|| "Invitation revoked.".to_string()));
        }
        Command::Shifts { view, anchor } => shifts(ctx, view.range(anchor)).await?,
        Command::Patterns => {
            let patterns = ctx.cache.query::<ListShiftPatterns>(()).await?;
            for pattern in patterns.iter() {
                println!(
                    "{:<10} {:<NAME_WIDTH$} {}-{}{}",
                    pattern.id,
                    truncate_string(&pattern.name, NAME_WIDTH),
                    pattern.start_time.format("%H:%M"),
                    pattern.end_time.format("%H:%M"),
                    if pattern.is_overnight() { " (overnight)" } else { "" }
                );
            }
        }
        Command::Assign {
            date,
            shift_id,
            user_ids,
        } => assign(ctx, date, shift_id, user_ids).await?,
        Command::Unassign { shift_id, user_id } => {
            let shift = ctx
                .cache
                .mutate::<UnassignStaff>(&UnassignStaffArgs { shift_id, user_id })
                .await?;
            println!("{} open slot(s) on shift {}", shift.open_slots(), shift.id);
        }
        Command::Attendance { view, anchor } => attendance(ctx, view.range(anchor)).await?,
        Command::Qr => {
            let qr = ctx.cache.mutate::<GenerateQrCode>(&()).await?;
            println!("{}", qr.code);
            println!(
                "Valid until {}",
                qr.expires_at.with_timezone(&Local).format("%H:%M:%S")
            );
        }
        Command::Scan { code } => {
            let result = ctx
                .cache
                .mutate::<ScanQrCode>(&ScanQrCodeArgs { code })
                .await?;
            let at = result
                .record
                .clock_out
                .unwrap_or(result.record.clock_in)
                .with_timezone(&Local);
            println!("{:?} at {}", result.action, at.format("%H:%M"));
        }
        Command::TemporaryHomes => {
            let homes = ctx.cache.query::<ListTemporaryHomes>(()).await?;
            for home in homes.iter() {
                let claimed = match (&home.claimed_by, home.is_claimed) {
                    (Some(by), true) => format!("claimed by {}", by),
                    (None, true) => "claimed".to_string(),
                    _ => "unclaimed".to_string(),
                };
                println!(
                    "{:<12} {:<NAME_WIDTH$} {}",
                    home.temporary_id,
                    truncate_string(&home.name, NAME_WIDTH),
                    claimed
                );
            }
        }
        Command::Claim {
            temporary_id,
            organization_id,
        } => {
            let outcome = ctx
                .cache
                .mutate::<ClaimTemporaryHome>(&ClaimTemporaryHomeArgs {
                    temporary_id,
                    organization_id,
                })
                .await?;
            println!(
                "Claimed {}: {}",
                outcome.temporary_id,
                outcome.migration_stats.summary()
            );
        }
        Command::Unclaim { temporary_id } => {
            let outcome = ctx
                .cache
                .mutate::<UnclaimTemporaryHome>(&temporary_id)
                .await?;
            println!(
                "Unclaimed {}: {}",
                outcome.temporary_id,
                outcome.migration_stats.summary()
            );
        }
        Command::Endpoints => {
            for info in catalog() {
                let kind = match info.kind {
                    OperationKind::Read => "provides",
                    OperationKind::Write => "invalidates",
                };
                let tags: Vec<&str> = info.tags.iter().map(|t| t.as_str()).collect();
                println!(
                    "{:<26} {:<6} {} [{}]",
                    info.name,
                    info.method.as_str(),
                    kind,
                    tags.join(", ")
                );
            }
        }
    }
    Ok(())
}

async fn login(ctx: &AppContext, email: Option<String>) -> Result<()> {
    let email = match email
        .or_else(|| std::env::var(EMAIL_ENV).ok())
        .or_else(|| ctx.config.last_email.clone())
    {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => prompt_password()?,
    };
    if email.is_empty() || password.is_empty() {
        bail!("Email and password required");
    }

    let state = ctx.login(&email, &password).await.context("Login failed")?;

    let mut config = ctx.config.clone();
    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    let name = state
        .user
        .as_ref()
        .map(|u| u.display_name())
        .unwrap_or_default();
    match state.current_organization {
        Some(org) => println!("Signed in as {} ({})", name, org.name),
        None => println!("Signed in as {}", name),
    }
    Ok(())
}

async fn whoami(ctx: &AppContext) -> Result<()> {
    let profile = ctx.load_profile().await?;
    println!("{} <{}>", profile.user.display_name(), profile.user.email);
    if let Some(ref phone) = profile.user.phone {
        println!("Phone:        {}", format_phone(phone));
    }
    if let Some(ref org) = profile.current_organization {
        println!("Organization: {} ({})", org.name, org.id);
        if let Some(address) = org.address.as_ref().and_then(|a| a.formatted()) {
            println!("Address:      {}", address);
        }
    }
    if let Some(staff_type) = profile.staff_type {
        println!("Staff type:   {:?}", staff_type);
    }
    if !profile.permissions.is_empty() {
        println!("Permissions:  {}", profile.permissions.join(", "));
    }
    Ok(())
}

async fn organizations(ctx: &AppContext, page: u64) -> Result<()> {
    let args = LinkedOrganizationsArgs {
        page,
        ..Default::default()
    };
    let linked = ctx.cache.query::<ListLinkedOrganizations>(args).await?;
    for org in &linked.data {
        println!(
            "{:<12} {:<NAME_WIDTH$} {:?}",
            org.id,
            truncate_string(&org.name, NAME_WIDTH),
            org.org_type
        );
    }
    println!("{}", linked.showing_label());
    Ok(())
}

async fn staff(ctx: &AppContext, page: u64, search: Option<String>) -> Result<()> {
    let args = ListStaffArgs {
        page,
        search,
        ..Default::default()
    };
    let staff = ctx.cache.query::<ListStaff>(args).await?;
    for member in &staff.data {
        println!(
            "{:<12} {:<NAME_WIDTH$} {}",
            member.user.id,
            truncate_string(&member.user.display_name(), NAME_WIDTH),
            member.role.display_name()
        );
    }
    println!("{}", staff.showing_label());
    Ok(())
}

/// Watches the range through a subscription so the listing reflects any
/// refetch started while it loads.
async fn shifts(ctx: &AppContext, range: DateRange) -> Result<()> {
    let mut subscription = ctx.cache.subscribe::<ListShifts>(range.into())?;
    let state = subscription.settled().await;
    if let Some(error) = state.error.clone() {
        return Err(error.into());
    }
    let shifts = state.data.clone().unwrap_or_default();

    for day in range.iter_days() {
        let todays: Vec<_> = shifts.iter().filter(|s| s.date == day).collect();
        if todays.is_empty() {
            continue;
        }
        println!("{}", format_date(day));
        for shift in todays {
            let names: Vec<String> = shift
                .assigned_users
                .iter()
                .map(|u| u.display_name())
                .collect();
            println!(
                "  {:<10} {:<16} {}-{}  {}/{}{}  {}",
                shift.id,
                truncate_string(&shift.pattern.name, 16),
                shift.pattern.start_time.format("%H:%M"),
                shift.pattern.end_time.format("%H:%M"),
                shift.assigned_users.len(),
                shift.count,
                if shift.is_overfilled() { " overfilled" } else { "" },
                names.join(", ")
            );
        }
    }
    println!("Updated {}", state.age_display());
    Ok(())
}

async fn assign(
    ctx: &AppContext,
    date: NaiveDate,
    shift_id: String,
    user_ids: Vec<String>,
) -> Result<()> {
    let day = CalendarView::Day.range(date);
    let shifts = ctx.cache.query::<ListShifts>(day.into()).await?;
    let args = match shifts.iter().find(|s| s.id == shift_id) {
        Some(shift) => AssignStaffArgs::for_shift(shift, user_ids),
        None => {
            warn!(shift = %shift_id, %date, "Shift not in calendar, skipping capacity check");
            AssignStaffArgs {
                shift_id,
                user_ids,
                open_slots: None,
            }
        }
    };

    let shift = ctx.cache.mutate::<AssignStaff>(&args).await?;
    println!(
        "Shift {} now has {}/{} assigned",
        shift.id,
        shift.assigned_users.len(),
        shift.count
    );
    Ok(())
}

async fn attendance(ctx: &AppContext, range: DateRange) -> Result<()> {
    let records = ctx.cache.query::<ListAttendance>(range.into()).await?;
    let now = Utc::now();
    for record in records.iter() {
        let who = record
            .user
            .as_ref()
            .map(|u| u.display_name())
            .unwrap_or_else(|| "-".to_string());
        let worked = record.worked(now);
        println!(
            "{:<NAME_WIDTH$} {}  {}h{:02}m{}",
            truncate_string(&who, NAME_WIDTH),
            record.clock_in.with_timezone(&Local).format("%a %d %b %H:%M"),
            worked.num_hours(),
            worked.num_minutes() % 60,
            if record.is_open() { " (on site)" } else { "" }
        );
    }
    Ok(())
}

fn parse_role(role: &str) -> Result<StaffRole> {
    match role.to_ascii_lowercase().as_str() {
        "admin" => Ok(StaffRole::Admin),
        "manager" => Ok(StaffRole::Manager),
        "staff" => Ok(StaffRole::Staff),
        other => bail!("Unknown role '{}', expected admin, manager or staff", other),
    }
}

fn print_invitations(invitations: &[Invitation]) {
    let now = Utc::now();
    for invitation in invitations {
        let who = invitation
            .email
            .clone()
            .or_else(|| invitation.organization.as_ref().map(|o| o.name.clone()))
            .unwrap_or_default();
        println!(
            "{:<12} {:<NAME_WIDTH$} {:?}",
            invitation.id,
            truncate_string(&who, NAME_WIDTH),
            invitation.effective_status(now)
        );
    }
}
