//! Sign-in, sign-up and role selection.

use crate::app::BoardApp;
use anyhow::{bail, Context};
use board_types::Role;
use remote_data_client::{AuthEvent, SignUpOutcome};
use session_identity_store::SessionOutcome;

fn parse_role(raw: &str) -> anyhow::Result<Role> {
    let role: Role = raw.parse().with_context(|| format!("unknown role {:?}", raw))?;
    if role == Role::Admin {
        bail!("admin accounts cannot be created from the client");
    }
    Ok(role)
}

fn report(outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Ready(identity) => {
            println!("Signed in as {} ({})", identity.email.as_deref().unwrap_or(&identity.id), identity.role);
        }
        SessionOutcome::RoleSelectionRequired { user } => {
            println!(
                "Signed in as {}. Choose a role with `teacher-board choose-role <teacher|school>`.",
                user.email.as_deref().unwrap_or(&user.id)
            );
        }
        SessionOutcome::Anonymous => {
            println!("Signed in, but the profile could not be loaded. Try again later.");
        }
        SessionOutcome::SignedOut => println!("Not signed in."),
    }
}

pub async fn login(
    app: &BoardApp,
    email: &str,
    password: &str,
    role: Option<String>,
) -> anyhow::Result<()> {
    if let Some(raw) = role.as_deref() {
        app.session.remember_role_hint(parse_role(raw)?)?;
    }
    let user = app.client.sign_in_with_password(email, password, role.clone()).await?;
    let outcome = app
        .session
        .handle_auth_event(AuthEvent::SignedIn {
            user,
            redirect_role: role,
        })
        .await?;
    report(&outcome);
    Ok(())
}

pub async fn signup(app: &BoardApp, email: &str, password: &str, role: &str) -> anyhow::Result<()> {
    let role = parse_role(role)?;
    app.session.remember_role_hint(role)?;

    match app.client.sign_up(email, password, Some(role.as_str())).await? {
        SignUpOutcome::SignedIn(user) => {
            let outcome = app
                .session
                .handle_auth_event(AuthEvent::SignedIn {
                    user,
                    redirect_role: Some(role.as_str().to_string()),
                })
                .await?;
            report(&outcome);
        }
        SignUpOutcome::ConfirmationRequired(_) => {
            println!("Check your inbox to confirm {}, then run `teacher-board login`.", email);
        }
    }
    Ok(())
}

pub async fn logout(app: &BoardApp) -> anyhow::Result<()> {
    app.client.sign_out().await?;
    app.session.handle_auth_event(AuthEvent::SignedOut).await?;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(app: &BoardApp) -> anyhow::Result<()> {
    let outcome = app.resume().await?;
    report(&outcome);
    Ok(())
}

pub async fn choose_role(app: &BoardApp, raw: &str) -> anyhow::Result<()> {
    let role = parse_role(raw)?;
    match app.resume().await? {
        SessionOutcome::RoleSelectionRequired { .. } => {
            let identity = app.session.complete_role_selection(role).await?;
            println!("Role set to {}.", identity.role);
        }
        SessionOutcome::Ready(identity) => {
            bail!("role is already {} and cannot be changed", identity.role);
        }
        SessionOutcome::Anonymous | SessionOutcome::SignedOut => {
            bail!("sign in before choosing a role");
        }
    }
    Ok(())
}
