use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::db::sqlite;
use crate::error::{FailureKind, ScreenError, ServiceError};
use crate::models::{
    AccountSettings, AppearanceSettings, CompanySettings, NotificationPreferences, UserSettings,
};
use crate::query_log::{Field, OperationRecord, QueryLogStore};
use crate::screen::{form, AccountSource};
use crate::session::Session;
use crate::toast::{Toast, Toaster};

/// Settings page for the acting principal.
///
/// The account section writes the principal's `admins` row; company,
/// notification and appearance sections live in the local metadata store.
pub struct SettingsScreen<A: AccountSource> {
    account: A,
    session: Session,
    /// Account details as last saved; seeded from the session
    profile: Mutex<AccountSettings>,
    metadata: Arc<Mutex<Connection>>,
    log: QueryLogStore,
    toaster: Arc<dyn Toaster>,
}

impl<A: AccountSource> SettingsScreen<A> {
    pub fn new(
        account: A,
        session: Session,
        metadata: Arc<Mutex<Connection>>,
        log: QueryLogStore,
        toaster: Arc<dyn Toaster>,
    ) -> Self {
        let profile = Mutex::new(AccountSettings {
            name: session.name.clone(),
            email: session.email.clone(),
        });
        SettingsScreen {
            account,
            session,
            profile,
            metadata,
            log,
            toaster,
        }
    }

    pub fn log(&self) -> &QueryLogStore {
        &self.log
    }

    pub fn account(&self) -> AccountSettings {
        self.profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stored settings for the principal; defaults when nothing is stored or the store fails
    pub fn load(&self) -> UserSettings {
        let conn = self.metadata.lock().unwrap_or_else(PoisonError::into_inner);
        match sqlite::load_user_settings(&conn, &self.session.admin_id) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load settings for {}: {}", self.session.email, e);
                UserSettings::default()
            }
        }
    }

    pub async fn save_account(&self, account: AccountSettings) -> Result<(), ScreenError> {
        let checked = form::required("Name", &account.name)
            .and_then(|name| Ok((name, form::email("Email", &account.email)?)));
        let (name, email) = match checked {
            Ok(values) => values,
            Err(e) => {
                self.toaster.show(Toast::error(e.to_string()));
                return Err(e.into());
            }
        };
        let account = AccountSettings { name, email };

        let entry = self.log.append(
            OperationRecord::Update {
                table: "admins",
                fields: vec![
                    Field::new("name", account.name.as_str()),
                    Field::new("email", account.email.as_str()),
                ],
                key: Field::new("admin_id", self.session.admin_id),
            },
            "Update Account",
            None,
        );
        let start = Instant::now();
        let result = self
            .account
            .update_account(self.session.admin_id, &account)
            .await;
        entry.finish(start.elapsed());

        if result.is_ok() {
            *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = account;
        }
        self.finish(
            result,
            ("Settings saved", "Your account settings have been updated successfully."),
            "There was a problem saving your settings.",
        )
    }

    pub fn save_company(&self, company: CompanySettings) -> Result<(), ScreenError> {
        let result = self.update_local(|settings| settings.company = company);
        self.finish(
            result,
            ("Company settings saved", "Your company information has been updated successfully."),
            "There was a problem saving your company settings.",
        )
    }

    pub fn save_notifications(&self, preferences: NotificationPreferences) -> Result<(), ScreenError> {
        let result = self.update_local(|settings| settings.notifications = preferences);
        self.finish(
            result,
            ("Notification preferences saved", "Your notification preferences have been updated."),
            "There was a problem saving your notification preferences.",
        )
    }

    pub fn save_appearance(&self, appearance: AppearanceSettings) -> Result<(), ScreenError> {
        let result = self.update_local(|settings| settings.appearance = appearance);
        self.finish(
            result,
            ("Appearance settings saved", "Your appearance preferences have been updated."),
            "There was a problem saving your appearance preferences.",
        )
    }

    fn update_local(&self, change: impl FnOnce(&mut UserSettings)) -> Result<(), ServiceError> {
        let conn = self.metadata.lock().unwrap_or_else(PoisonError::into_inner);
        let mut settings = sqlite::load_user_settings(&conn, &self.session.admin_id)?;
        change(&mut settings);
        sqlite::save_user_settings(&conn, &self.session.admin_id, &settings)?;
        Ok(())
    }

    fn finish(
        &self,
        result: Result<(), ServiceError>,
        success: (&str, &str),
        failure: &str,
    ) -> Result<(), ScreenError> {
        match result {
            Ok(()) => {
                self.toaster.show(Toast::success(success.0, success.1));
                Ok(())
            }
            Err(e) => {
                log::error!("Error saving settings: {}", e);
                self.toaster.show(Toast::error(failure));
                Err(ScreenError::service(FailureKind::SaveFailed, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Density, ThemeMode};
    use crate::screen::testing::session;
    use crate::session::Role;
    use crate::toast::ToastLog;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingAccounts {
        writes: Mutex<Vec<(Uuid, AccountSettings)>>,
        fail: bool,
    }

    impl AccountSource for RecordingAccounts {
        async fn update_account(&self, admin_id: Uuid, account: &AccountSettings) -> Result<(), ServiceError> {
            if self.fail {
                return Err(ServiceError::NotFound("admin".to_string()));
            }
            self.writes.lock().unwrap().push((admin_id, account.clone()));
            Ok(())
        }
    }

    fn screen(accounts: RecordingAccounts, acting: Session) -> (SettingsScreen<RecordingAccounts>, Arc<ToastLog>) {
        let metadata = Arc::new(Mutex::new(sqlite::open_in_memory().unwrap()));
        let toasts = Arc::new(ToastLog::new());
        let screen = SettingsScreen::new(accounts, acting, metadata, QueryLogStore::new(), toasts.clone());
        (screen, toasts)
    }

    #[tokio::test]
    async fn account_is_written_for_the_acting_principal() {
        let acting = session(Role::Manager);
        let (screen, toasts) = screen(RecordingAccounts::default(), acting.clone());

        screen
            .save_account(AccountSettings {
                name: " Avery Q ".into(),
                email: "avery.q@example.com".into(),
            })
            .await
            .unwrap();

        let writes = screen.account.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, acting.admin_id);
        assert_eq!(writes[0].1.name, "Avery Q");

        let entry = &screen.log().all()[0];
        assert_eq!(entry.source, "Update Account");
        assert!(entry.description().ends_with(&format!("WHERE admin_id = '{}'", acting.admin_id)));
        assert_eq!(toasts.last().unwrap().title, "Settings saved");
    }

    #[tokio::test]
    async fn saved_account_is_shown_when_the_form_reopens() {
        let (screen, _) = screen(RecordingAccounts::default(), session(Role::Staff));
        assert_eq!(screen.account().email, "avery@example.com");

        screen
            .save_account(AccountSettings {
                name: "New Name".into(),
                email: "new@example.com".into(),
            })
            .await
            .unwrap();

        let shown = screen.account();
        assert_eq!(shown.name, "New Name");
        assert_eq!(shown.email, "new@example.com");
    }

    #[tokio::test]
    async fn failed_account_save_keeps_previous_details() {
        let accounts = RecordingAccounts {
            fail: true,
            ..Default::default()
        };
        let (screen, _) = screen(accounts, session(Role::Staff));

        let _ = screen
            .save_account(AccountSettings {
                name: "New Name".into(),
                email: "new@example.com".into(),
            })
            .await;

        let shown = screen.account();
        assert_eq!(shown.name, "Avery Quinn");
        assert_eq!(shown.email, "avery@example.com");
    }

    #[tokio::test]
    async fn account_failure_uses_fixed_message() {
        let accounts = RecordingAccounts {
            fail: true,
            ..Default::default()
        };
        let (screen, toasts) = screen(accounts, session(Role::Staff));

        let err = screen
            .save_account(AccountSettings {
                name: "Avery".into(),
                email: "avery@example.com".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(FailureKind::SaveFailed), FailureKind::SaveFailed);

        let toast = toasts.last().unwrap();
        assert_eq!(toast.title, "Error");
        assert_eq!(toast.description.as_deref(), Some("There was a problem saving your settings."));
        assert!(toast.is_destructive());
    }

    #[tokio::test]
    async fn invalid_account_is_not_sent() {
        let (screen, toasts) = screen(RecordingAccounts::default(), session(Role::Staff));
        let result = screen
            .save_account(AccountSettings {
                name: "Avery".into(),
                email: "not-an-email".into(),
            })
            .await;
        assert!(matches!(result, Err(ScreenError::Validation(_))));
        assert!(screen.account.writes.lock().unwrap().is_empty());
        assert!(screen.log().is_empty());
        assert!(toasts.last().unwrap().is_destructive());
    }

    #[test]
    fn local_sections_persist_independently() {
        let (screen, toasts) = screen(RecordingAccounts::default(), session(Role::Staff));

        screen
            .save_company(CompanySettings {
                company_name: "Northwind".into(),
                website: "https://northwind.example".into(),
                address: "1 Harbour St".into(),
                phone: "555-0100".into(),
            })
            .unwrap();
        screen
            .save_appearance(AppearanceSettings {
                theme: ThemeMode::Dark,
                density: Density::Compact,
            })
            .unwrap();

        let stored = screen.load();
        assert_eq!(stored.company.company_name, "Northwind");
        assert_eq!(stored.appearance.theme, ThemeMode::Dark);
        assert_eq!(stored.notifications, NotificationPreferences::default());

        let titles: Vec<String> = toasts.toasts().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Company settings saved", "Appearance settings saved"]);
    }

    #[test]
    fn settings_are_scoped_per_principal() {
        let metadata = Arc::new(Mutex::new(sqlite::open_in_memory().unwrap()));
        let first = SettingsScreen::new(
            RecordingAccounts::default(),
            session(Role::Staff),
            metadata.clone(),
            QueryLogStore::new(),
            Arc::new(ToastLog::new()),
        );
        let second = SettingsScreen::new(
            RecordingAccounts::default(),
            session(Role::Staff),
            metadata,
            QueryLogStore::new(),
            Arc::new(ToastLog::new()),
        );

        first
            .save_notifications(NotificationPreferences {
                sms_alerts: true,
                ..Default::default()
            })
            .unwrap();

        assert!(first.load().notifications.sms_alerts);
        assert!(!second.load().notifications.sms_alerts);
    }
}
