//! OpenAPI documentation configuration

use utoipa::OpenApi;

use crate::handlers::passkey::{
    AuthenticationVerifyResponse, RegistrationOptionsRequest, RegistrationVerifyResponse,
};

/// Keybridge - Biometric Login API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Keybridge - Biometric Login API",
        version = "0.1.0",
        description = r#"
Passwordless storefront login with platform authenticators (Face ID, Touch
ID, Windows Hello, hardware keys).

### Flow

1. A customer signs in once through a social-login provider; the callback
   hands the browser a short-lived **bridge token**.
2. `POST /webauthn/register/options` + `/verify` register the platform
   credential against that identity.
3. On the next visit, `GET /webauthn/authenticate/options` +
   `POST /webauthn/authenticate/verify` authenticate with the credential
   alone and answer with a storefront login redirect.

The server stores only public keys and signature counters - never private
keys or biometric data.
"#
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::passkey::registration_options,
        crate::handlers::passkey::registration_verify,
        crate::handlers::passkey::authentication_options,
        crate::handlers::passkey::authentication_verify,
    ),
    components(schemas(
        RegistrationOptionsRequest,
        RegistrationVerifyResponse,
        AuthenticationVerifyResponse,
    )),
    tags(
        (name = "WebAuthn", description = "Registration and authentication ceremonies"),
        (name = "Health", description = "Monitoring endpoints")
    )
)]
pub struct ApiDoc;
