//! Shared display helpers.
//!
//! Used by `up`, `configure`, `env` and `shell` to render services and
//! connection environments the same way.

use crate::environment::ConnectionEnvironment;
use crate::framework::StartedService;
use crate::ui::{BerthTheme, UserInterface};

/// Width of the key column in field listings.
const KEY_WIDTH: usize = 10;

/// Replace a secret with a fixed mask, keeping empty values visibly empty.
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

/// Docker-style 12 character container id.
pub fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

/// One line per started container.
pub fn show_started(ui: &mut dyn UserInterface, started: &[StartedService]) {
    let theme = BerthTheme::new();
    for service in started {
        ui.message(&format!(
            "  {} {} {}",
            theme.highlight.apply_to(service.dependency),
            service.name,
            theme.dim.apply_to(format!("({})", short_id(&service.container_id)))
        ));
    }
}

/// Key/value lines describing a connection environment.
///
/// Passwords are masked unless `reveal` is set.
pub fn environment_lines(
    environment: &ConnectionEnvironment,
    theme: &BerthTheme,
    reveal: bool,
) -> Vec<String> {
    let secret = |value: &str| {
        if reveal {
            value.to_string()
        } else {
            mask(value)
        }
    };

    let fields: Vec<(&str, String)> = match environment {
        ConnectionEnvironment::Postgres(env) => vec![
            ("host", env.host.clone()),
            ("port", env.port.to_string()),
            ("user", env.user.clone()),
            ("password", secret(&env.password)),
            ("db", env.db.clone()),
        ],
        ConnectionEnvironment::Redis(env) => vec![
            ("host", env.host.clone()),
            ("port", env.port.to_string()),
            ("user", env.username.clone().unwrap_or_default()),
            ("password", secret(env.password.as_deref().unwrap_or_default())),
            ("db", env.db.to_string()),
            ("tls", env.tls.to_string()),
        ],
    };

    fields
        .into_iter()
        .map(|(key, value)| theme.format_field(key, &value, KEY_WIDTH))
        .collect()
}
