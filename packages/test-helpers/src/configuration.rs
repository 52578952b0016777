use std::env;

use seedbox_gateway_configuration::{Configuration, Credentials, Threshold};

use crate::random;

/// This configuration is used for testing. It generates random config values
/// so they do not collide if you run more than one gateway at the same time.
///
/// # Panics
///
/// Will panic if it can't convert the temp file path to string
#[must_use]
pub fn ephemeral() -> Configuration {
    let mut config = Configuration::default();

    // Change to `Threshold::Debug` for tests debugging
    config.logging.threshold = Threshold::Off;

    // Ephemeral token file
    let temp_directory = env::temp_dir();
    let random_file_id = random::string(16);
    let temp_file = temp_directory.join(format!("tokens_{random_file_id}.json"));
    config.core.token_file = temp_file.to_str().unwrap().into();

    config
}

/// Same as [`ephemeral`], but with single-tenant mode enabled and the given
/// default account credentials.
#[must_use]
pub fn ephemeral_single_tenant(username: &str, password: &str) -> Configuration {
    let mut config = ephemeral();

    config.core.single_tenant = true;
    config.core.default_account = Some(Credentials::new(username.to_owned(), password.to_owned()));

    config
}

/// Same as [`ephemeral`], but with single-tenant mode enabled and no
/// default account configured. Lookups in this mode warn and fail the
/// lazy default authentication.
#[must_use]
pub fn ephemeral_single_tenant_without_credentials() -> Configuration {
    let mut config = ephemeral();

    config.core.single_tenant = true;
    config.core.default_account = None;

    config
}
