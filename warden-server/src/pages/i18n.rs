//! Texts of the login and consent pages in every supported language.

use http::header::ACCEPT_LANGUAGE;
use http::HeaderMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    De,
}

impl Lang {
    /// Picks the language of the first `Accept-Language` entry, English if unsupported
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let code: String = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|first| first.trim().chars().take(2).collect::<String>().to_lowercase())
            .unwrap_or_default();

        Self::from_code(&code)
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "de" => Lang::De,
            _ => Lang::En,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::De => "de",
        }
    }
}

pub struct LoginText {
    pub headline: &'static str,
    pub email_label: &'static str,
    pub password_label: &'static str,
    pub submit_button: &'static str,
    pub input_err: &'static str,
    pub login_err: &'static str,
    pub attempts_err: &'static str,
    pub or: &'static str,
    pub button_login_github: &'static str,
    pub button_login_slack: &'static str,
    pub button_login_google: &'static str,
    pub button_login_microsoft: &'static str,
}

impl LoginText {
    /// Message for an error key, `None` for unknown keys
    pub fn error(&self, key: &str) -> Option<&'static str> {
        match key {
            "input_err" => Some(self.input_err),
            "login_err" => Some(self.login_err),
            "attempts_err" => Some(self.attempts_err),
            _ => None,
        }
    }
}

pub struct MessageText {
    pub headline: &'static str,
    pub text: &'static str,
}

pub struct ConsentText {
    pub headline: &'static str,
    pub text: &'static str,
    pub noscopes_text: &'static str,
    pub submit_button: &'static str,
}

pub struct PasswordResetText {
    pub headline: &'static str,
    pub oldpwd_label: &'static str,
    pub newpwd1_label: &'static str,
    pub newpwd2_label: &'static str,
    pub submit_button: &'static str,
    pub input_err: &'static str,
    pub match_err: &'static str,
    pub password_rules_err: &'static str,
    pub password_err: &'static str,
}

impl PasswordResetText {
    pub fn error(&self, key: &str) -> Option<&'static str> {
        match key {
            "input_err" => Some(self.input_err),
            "match_err" => Some(self.match_err),
            "password_rules_err" => Some(self.password_rules_err),
            "password_err" => Some(self.password_err),
            _ => None,
        }
    }
}

pub fn login(lang: Lang) -> &'static LoginText {
    match lang {
        Lang::En => &LoginText {
            headline: "Login",
            email_label: "Email",
            password_label: "Password",
            submit_button: "Login",
            input_err: "Please enter your email address and password.",
            login_err: "Incorrect email address or password.",
            attempts_err: "Maximum login attempts reached, please wait 5 minutes and try again.",
            or: "or",
            button_login_github: "Sign in with GitHub",
            button_login_slack: "Sign in with Slack",
            button_login_google: "Sign in with Google",
            button_login_microsoft: "Sign in with Microsoft",
        },
        Lang::De => &LoginText {
            headline: "Anmelden",
            email_label: "E-Mail-Adresse",
            password_label: "Passwort",
            submit_button: "Anmelden",
            input_err: "Bitte gib deine E-Mail-Adresse und Passwort ein.",
            login_err: "Ungültige E-Mail-Adresse oder Passwort.",
            attempts_err:
                "Maximum Loginversuchen erreicht, bitte warte 5 Minuten und versuche es erneut.",
            or: "oder",
            button_login_github: "Mit GitHub anmelden",
            button_login_slack: "Mit Slack anmelden",
            button_login_google: "Mit Google anmelden",
            button_login_microsoft: "Mit Microsoft anmelden",
        },
    }
}

pub fn login_success(lang: Lang) -> &'static MessageText {
    match lang {
        Lang::En => &MessageText {
            headline: "Login successful",
            text: "Your login was successful.",
        },
        Lang::De => &MessageText {
            headline: "Anmeldung erfolgreich",
            text: "Deine Anmeldung war erfolgreich.",
        },
    }
}

pub fn logout(lang: Lang) -> &'static MessageText {
    match lang {
        Lang::En => &MessageText {
            headline: "Logout",
            text: "You have successfully logged out.",
        },
        Lang::De => &MessageText {
            headline: "Abmelden",
            text: "Du wurdest erfolgreich abgemeldet.",
        },
    }
}

pub fn client_unknown(lang: Lang) -> &'static MessageText {
    match lang {
        Lang::En => &MessageText {
            headline: "Unknown application",
            text: "The application could not be identified. Please contact the developer of the application.",
        },
        Lang::De => &MessageText {
            headline: "Unbekannte Anwendung",
            text: "Die Anwendung konnte nicht identifiziert werden. Bitte kontaktiere den Entwickler der Anwendung.",
        },
    }
}

pub fn sso_error(lang: Lang) -> &'static MessageText {
    match lang {
        Lang::En => &MessageText {
            headline: "Error on Authorization",
            text: "An error occurred while authorizing your account. Please try again.",
        },
        Lang::De => &MessageText {
            headline: "Fehler bei der Autorisierung",
            text: "Während der Autorisierung deines Accounts ist ein Fehler aufgetreten. Bitte versuche es erneut.",
        },
    }
}

pub fn consent(lang: Lang) -> &'static ConsentText {
    match lang {
        Lang::En => &ConsentText {
            headline: "Authorize",
            text: "The application will gain the following access rights",
            noscopes_text: "Authorize application",
            submit_button: "Authorize",
        },
        Lang::De => &ConsentText {
            headline: "Autorisierung",
            text: "Der Anwendung werden folgende Zugriffsrechte gewährt",
            noscopes_text: "Anwendung autorisieren",
            submit_button: "Autorisieren",
        },
    }
}

pub fn password_reset(lang: Lang) -> &'static PasswordResetText {
    match lang {
        Lang::En => &PasswordResetText {
            headline: "Reset password",
            oldpwd_label: "Temporary password",
            newpwd1_label: "New password",
            newpwd2_label: "Repeat new password",
            submit_button: "Confirm password",
            input_err: "Please fill out the form.",
            match_err: "The new password does not match.",
            password_rules_err: "The password does not match the password rules.",
            password_err: "The temporary password is incorrect.",
        },
        Lang::De => &PasswordResetText {
            headline: "Passwort zurücksetzen",
            oldpwd_label: "Temporäres Passwort",
            newpwd1_label: "Neues Passwort",
            newpwd2_label: "Neues Passwort wiederholen",
            submit_button: "Passwort bestätigen",
            input_err: "Bitte fülle das Formular aus.",
            match_err: "Das neue Passwort stimmt nicht überein.",
            password_rules_err: "Das neue Passwort entspricht nicht den Passwort Regeln.",
            password_err: "Das temporäre Passwort ist falsch.",
        },
    }
}
