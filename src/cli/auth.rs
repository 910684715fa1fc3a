use crate::{
    auth::{Acquirer, AuthOrchestrator, TokenValidator},
    config::Settings,
    error,
    management::TokenStore,
    suno::{SessionProbe, SunoClient},
    success, warning,
};

fn orchestrator(settings: &Settings) -> AuthOrchestrator<SessionProbe> {
    let probe = match SessionProbe::new(settings) {
        Ok(p) => p,
        Err(e) => error!("Cannot build HTTP client: {}", e),
    };
    let acquirer = match Acquirer::standard(settings) {
        Ok(a) => a,
        Err(e) => error!("Cannot prepare sign-in: {}", e),
    };

    AuthOrchestrator::new(
        TokenStore::new(settings.home.clone()),
        TokenValidator::new(probe),
        acquirer,
    )
}

/// Signs in and returns a client carrying the usable token.
///
/// Exits the process when no token can be obtained.
pub async fn connect(settings: &Settings) -> SunoClient {
    let mut auth = orchestrator(settings);
    let credential = match auth.get_usable_credential().await {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };

    match SunoClient::new(settings, credential) {
        Ok(client) => client,
        Err(e) => error!("Cannot build HTTP client: {}", e),
    }
}

pub async fn auth(settings: &Settings) {
    let client = connect(settings).await;

    match client.session().await.as_ref().and_then(|s| s.user_name()) {
        Some(name) => success!("Signed in as {}", name),
        None => success!("Signed in"),
    }
}

pub async fn logout(settings: &Settings) {
    let mut auth = orchestrator(settings);
    match auth.logout().await {
        Ok(()) => success!("Token cleared"),
        Err(e) => warning!("Could not clear token: {}", e),
    }
}

pub async fn whoami(settings: &Settings) {
    let client = connect(settings).await;

    let Some(session) = client.session().await else {
        warning!("Could not fetch session information");
        return;
    };

    let user = session.user.unwrap_or_default();
    println!("Name:  {}", user.name.as_deref().unwrap_or("Unknown"));
    if let Some(email) = user.email {
        println!("Email: {}", email);
    }
    if let Some(id) = user.id {
        println!("Id:    {}", id);
    }
}
