//! Django settings.

use serde_json::{json, Value};

use super::Framework;
use crate::environment::{EnvLookup, Platform, PostgresEnvironment, RedisEnvironment};
use crate::settings::{FrameworkSettings, SettingsPatch};

const POSTGRES_ENGINE: &str = "django.db.backends.postgresql";
const SECURITY_MIDDLEWARE: &str = "django.middleware.security.SecurityMiddleware";
const WHITENOISE_MIDDLEWARE: &str = "whitenoise.middleware.WhiteNoiseMiddleware";
const WHITENOISE_STORAGE: &str = "whitenoise.storage.CompressedManifestStaticFilesStorage";
const SECRET_KEY_VAR: &str = "SECRET_KEY";

/// Writes `DATABASES`, the Celery broker settings and, on remote hosts,
/// the production settings a platform expects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Django;

/// Hostname suffix served by a platform, for `ALLOWED_HOSTS`.
fn allowed_host(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::Render => Some(".onrender.com"),
        Platform::Railway => Some(".up.railway.app"),
        Platform::Heroku => Some(".herokuapp.com"),
        Platform::Local | Platform::UnknownRemote => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}

impl Framework for Django {
    fn name(&self) -> &'static str {
        "django"
    }

    /// `DEBUG` follows Django's default of off when absent.
    fn is_debug(&self, settings: &FrameworkSettings) -> bool {
        settings.get("DEBUG").is_some_and(truthy)
    }

    fn postgres_patch(&self, env: &PostgresEnvironment) -> SettingsPatch {
        SettingsPatch::new().set(
            "DATABASES",
            json!({
                "default": {
                    "ENGINE": POSTGRES_ENGINE,
                    "NAME": env.db,
                    "USER": env.user,
                    "PASSWORD": env.password,
                    "HOST": env.host,
                    "PORT": env.port,
                }
            }),
        )
    }

    fn redis_patch(&self, env: &RedisEnvironment) -> SettingsPatch {
        let url = env.url();
        SettingsPatch::new()
            .set("CELERY_BROKER_URL", url.clone())
            .set("CELERY_RESULT_BACKEND", url)
    }

    fn remote_patch(
        &self,
        platform: Platform,
        settings: &FrameworkSettings,
        env_fn: &EnvLookup,
    ) -> SettingsPatch {
        let mut patch = SettingsPatch::new();

        if let Some(host) = allowed_host(platform) {
            patch = patch.extend("ALLOWED_HOSTS", [host]);
        }

        patch = patch.set("DEBUG", false);

        if let Ok(secret) = env_fn(SECRET_KEY_VAR) {
            if !secret.trim().is_empty() {
                patch = patch.set("SECRET_KEY", secret);
            }
        }

        let static_root = match settings.get_str("BASE_DIR").map(str::trim) {
            Some(base) if !base.is_empty() => {
                format!("{}/staticfiles", base.trim_end_matches('/'))
            }
            _ => "staticfiles".to_string(),
        };

        patch
            .set("STATIC_ROOT", static_root)
            .set("STATICFILES_STORAGE", WHITENOISE_STORAGE)
            .insert_after("MIDDLEWARE", WHITENOISE_MIDDLEWARE, SECURITY_MIDDLEWARE)
    }
}
