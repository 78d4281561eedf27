//! Sign-in, sign-out and token maintenance.

use tokio::runtime::Runtime;
use tracing::warn;

use super::Context;
use crate::api::{ApiError, Endpoint};
use crate::error::{Error, ResultExt};
use crate::projection::{self, RecordKind};

/// Print the authorization URL, or finish sign-in with the callback code.
pub fn cmd_login(rt: &Runtime, ctx: &Context, code: Option<&str>) -> anyhow::Result<()> {
    rt.block_on(async {
        let Some(code) = code else {
            let url = ctx
                .client
                .auth_url()
                .await
                .with_context("Failed to get the authorization URL")?;
            println!("Open this URL in a browser to authorize feedback.fm:\n\n  {}\n", url);
            println!("Then finish with: feedback-fm login --code <code>");
            return Ok(());
        };

        let credential = ctx
            .client
            .exchange_code(code.trim())
            .await
            .with_context("Authentication failed")?;
        let listener = credential.subject_id.clone();
        ctx.session.sign_in(credential).map_err(Error::from)?;
        println!("Signed in as listener {}.", listener);
        Ok::<_, anyhow::Error>(())
    })
}

pub fn cmd_logout(ctx: &Context) -> anyhow::Result<()> {
    if !ctx.session.is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }
    ctx.session.sign_out()?;
    println!("Signed out.");
    Ok(())
}

/// Swap the stored refresh token for a new access token.
pub fn cmd_refresh_token(rt: &Runtime, ctx: &Context) -> anyhow::Result<()> {
    let refresh_token = ctx
        .session
        .credential()
        .and_then(|c| c.refresh_token)
        .ok_or_else(|| Error::not_signed_in("no refresh token stored, run `feedback-fm login`"))?;

    rt.block_on(async {
        let response = match ctx.client.refresh_token(&refresh_token).await {
            Ok(response) => response,
            Err(ApiError::Unauthorized) => {
                ctx.session.invalidate();
                return Err(Error::not_signed_in(
                    "the refresh token was rejected, run `feedback-fm login`",
                )
                .into());
            }
            Err(e) => return Err(Error::from(e).context("Token refresh failed").into()),
        };

        ctx.session
            .update_tokens(response.access_token, response.refresh_token)?;
        match response.expires_in {
            Some(secs) => println!("Access token refreshed (valid for {} minutes).", secs / 60),
            None => println!("Access token refreshed."),
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Show the stored identity and, when reachable, the profile name.
pub fn cmd_whoami(rt: &Runtime, ctx: &Context) -> anyhow::Result<()> {
    let Some(listener) = ctx.session.subject_id() else {
        println!("Not signed in.");
        return Ok(());
    };

    rt.block_on(async {
        let endpoint = Endpoint::Profile {
            user_id: listener.clone(),
        };
        match ctx.client.get(&endpoint).await {
            Ok(profile) => {
                let name = projection::project_name(&profile, RecordKind::Artist);
                println!("{} (listener {})", name, listener);
            }
            Err(ApiError::Unauthorized) => {
                ctx.session.invalidate();
                println!("Session expired. Please login again.");
            }
            Err(e) => {
                warn!(target: "api", "Profile lookup failed: {}", e);
                println!("Listener {} (profile unavailable)", listener);
            }
        }
    });
    Ok(())
}
