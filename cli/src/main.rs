use std::path::PathBuf;
use std::sync::Arc;

use careconnect::api::types::{ContextEntry, ContextScope, Patient, PatientStatus, Registration, UserProfile};
use careconnect::config::{ConfigError, ENV_API_URL, ENV_STATE_DIR};
use careconnect::guard::{self, GuardDecision, Route};
use careconnect::state::chat::{ChatState, is_from_doctor};
use careconnect::state::notifications::NotificationsState;
use careconnect::state::patients::{PatientDialog, PatientFilter, PatientStats, PatientSubmission, StatusFilter};
use careconnect::{ApiClient, ApiError, AuthOutcome, AuthedClient, Config, FileStorage, SessionStore};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("request failed: {0}")]
    Api(#[from] ApiError),
    #[error("not logged in; run `careconnect login`")]
    NotLoggedIn,
    #[error("session expired; run `careconnect login`")]
    SessionExpired,
    #[error("session could not be verified: backend unreachable")]
    Unverified,
    #[error("{0}")]
    Auth(String),
    #[error("session verification task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "careconnect", about = "CareConnect dashboard CLI")]
struct Cli {
    #[arg(long, env = "CARECONNECT_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "CARECONNECT_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CARECONNECT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "CARECONNECT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        specialization: Option<String>,
    },
    Logout,
    Whoami,
    Patients(PatientsCommand),
    Notifications(NotificationsCommand),
    Contexts(ContextsCommand),
    Chats(ChatsCommand),
    Appointments(AppointmentsCommand),
    Profile(ProfileCommand),
}

#[derive(Args, Debug)]
struct PatientsCommand {
    #[command(subcommand)]
    command: PatientsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PatientsSubcommand {
    List {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value = "all", help = "all, active, inactive or discharged")]
        status: String,
    },
    Stats,
    Get {
        patient_id: String,
    },
    Search {
        query: String,
    },
    Add(PatientFields),
    Update {
        patient_id: String,
        #[command(flatten)]
        fields: PatientFields,
    },
    Deactivate {
        patient_id: String,
    },
    Delete {
        patient_id: String,
    },
}

#[derive(Args, Debug, Default)]
struct PatientFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    allergies: Option<String>,
    #[arg(long, help = "active, inactive or discharged")]
    status: Option<String>,
}

#[derive(Args, Debug)]
struct NotificationsCommand {
    #[command(subcommand)]
    command: NotificationsSubcommand,
}

#[derive(Subcommand, Debug)]
enum NotificationsSubcommand {
    List,
    Read { notification_id: String },
    Unread { notification_id: String },
    Delete { notification_id: String },
    ReadAll,
    Clear,
}

#[derive(Args, Debug)]
struct ContextsCommand {
    #[command(subcommand)]
    command: ContextsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ContextsSubcommand {
    List {
        #[arg(long, help = "List an appointment's local contexts instead of the global ones")]
        appointment: Option<String>,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        appointment: Option<String>,
    },
    Delete {
        context_id: String,
        #[arg(long, default_value_t = false)]
        local: bool,
    },
    Upload {
        path: PathBuf,
        #[arg(long)]
        appointment: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ChatsCommand {
    #[command(subcommand)]
    command: ChatsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatsSubcommand {
    History { appointment_id: String },
    Send { appointment_id: String, message: String },
}

#[derive(Args, Debug)]
struct AppointmentsCommand {
    #[command(subcommand)]
    command: AppointmentsSubcommand,
}

#[derive(Subcommand, Debug)]
enum AppointmentsSubcommand {
    List,
    Get {
        appointment_id: String,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        appointment_id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        appointment_id: String,
    },
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long, help = "JSON object of fields to change")]
        data: String,
    },
    Avatar {
        path: PathBuf,
    },
}

/// A restored session that passed the route guard.
struct SignedIn {
    api: ApiClient,
    token: String,
    user: UserProfile,
}

impl SignedIn {
    fn client(&self) -> AuthedClient<'_> {
        self.api.with_token(&self.token)
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let api = ApiClient::from_config(&config)?;
    let storage = Arc::new(FileStorage::new(&config.state_dir));
    let store = SessionStore::new(Arc::new(api.clone()), storage);
    tracing::debug!(api_url = %config.api_url, state_dir = %config.state_dir.display(), "cli configured");

    match cli.command {
        Command::Login { email, password } => {
            let outcome = store.login(&email, &password).await;
            report_auth(&store, outcome)
        }
        Command::Signup { name, email, password, phone, specialization } => {
            let mut registration = Registration::doctor(name, email, password);
            if let Some(phone) = phone {
                registration.extra.insert("phone".to_owned(), Value::String(phone));
            }
            if let Some(specialization) = specialization {
                registration.extra.insert("specialization".to_owned(), Value::String(specialization));
            }
            let outcome = store.signup(&registration).await;
            report_auth(&store, outcome)
        }
        Command::Logout => {
            store.logout().await;
            print_json(&json!({ "status": store.status().as_str() }))
        }
        Command::Whoami => {
            let signed_in = sign_in(&store, api, &Route::Profile).await?;
            print_json(&signed_in.user)
        }
        Command::Patients(command) => {
            let route = match &command.command {
                PatientsSubcommand::Get { patient_id } => Route::PatientDetails { patient_id: patient_id.clone() },
                _ => Route::Dashboard,
            };
            let signed_in = sign_in(&store, api, &route).await?;
            let result = run_patients(&signed_in, command.command).await;
            settle(&store, &signed_in, result).await
        }
        Command::Notifications(command) => {
            let signed_in = sign_in(&store, api, &Route::Notifications).await?;
            let result = run_notifications(&signed_in, command.command).await;
            settle(&store, &signed_in, result).await
        }
        Command::Contexts(command) => {
            let signed_in = sign_in(&store, api, &Route::GlobalContext).await?;
            let result = run_contexts(&signed_in, command.command).await;
            settle(&store, &signed_in, result).await
        }
        Command::Chats(command) => {
            let signed_in = sign_in(&store, api, &Route::Dashboard).await?;
            let result = run_chats(&signed_in, command.command).await;
            settle(&store, &signed_in, result).await
        }
        Command::Appointments(command) => {
            let signed_in = sign_in(&store, api, &Route::Dashboard).await?;
            let result = run_appointments(&signed_in, command.command).await;
            settle(&store, &signed_in, result).await
        }
        Command::Profile(command) => {
            let signed_in = sign_in(&store, api, &Route::Profile).await?;
            let result = run_profile(&signed_in, command.command).await;
            settle(&store, &signed_in, result).await
        }
    }
}

/// Environment config with command-line flags taking precedence.
fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let config = Config::from_lookup(|key| {
        let flag = match key {
            ENV_API_URL => cli.api_url.clone(),
            ENV_STATE_DIR => cli.state_dir.as_ref().map(|dir| dir.display().to_string()),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    })?;
    Ok(config)
}

/// Restore the persisted session, wait for the backend to confirm it, and
/// run the route guard before any protected call.
async fn sign_in(store: &SessionStore, api: ApiClient, route: &Route) -> Result<SignedIn, CliError> {
    if let Some(verify) = store.restore().await {
        let outcome = verify.await?;
        tracing::debug!(?outcome, "session verification settled");
    }

    let session = store.session();
    match guard::resolve(route, &session) {
        GuardDecision::Allow => {}
        GuardDecision::Redirect { to } => {
            tracing::debug!(%route, redirect = to, "guard redirected");
            return Err(CliError::NotLoggedIn);
        }
        GuardDecision::Loading => return Err(CliError::Unverified),
    }

    let token = store.token().ok_or(CliError::NotLoggedIn)?;
    let user = session.user().cloned().ok_or(CliError::NotLoggedIn)?;
    Ok(SignedIn { api, token, user })
}

/// A 401 from any service call ends the persisted session.
async fn settle(store: &SessionStore, signed_in: &SignedIn, result: Result<(), CliError>) -> Result<(), CliError> {
    if let Err(CliError::Api(error)) = &result {
        if store.on_api_error(&signed_in.token, error).await {
            return Err(CliError::SessionExpired);
        }
    }
    result
}

fn report_auth(store: &SessionStore, outcome: AuthOutcome) -> Result<(), CliError> {
    match outcome {
        AuthOutcome::Success { message } => print_json(&json!({
            "status": store.status().as_str(),
            "message": message,
            "user": store.session().user(),
        })),
        AuthOutcome::Failure { error } => Err(CliError::Auth(error)),
    }
}

async fn run_patients(signed_in: &SignedIn, command: PatientsSubcommand) -> Result<(), CliError> {
    let client = signed_in.client();
    let doctor_id = signed_in.user.id.as_str();
    match command {
        PatientsSubcommand::List { query, status } => {
            let status = StatusFilter::parse(&status).ok_or_else(|| CliError::InvalidArgument(format!("unknown status filter `{status}`")))?;
            let patients = client.list_patients(doctor_id).await?;
            let filter = PatientFilter { query, status };
            print_json(&filter.apply(&patients))
        }
        PatientsSubcommand::Stats => {
            let patients = client.list_patients(doctor_id).await?;
            let stats = PatientStats::from_patients(&patients);
            print_json(&json!({
                "total": stats.total,
                "active": stats.active,
                "inactive": stats.inactive,
                "discharged": stats.discharged,
            }))
        }
        PatientsSubcommand::Get { patient_id } => print_json(&client.get_patient(&patient_id).await?),
        PatientsSubcommand::Search { query } => print_json(&client.search_patients(&query).await?),
        PatientsSubcommand::Add(fields) => {
            let existing = client.list_patients(doctor_id).await?.len();
            let mut dialog = PatientDialog::add();
            apply_patient_fields(&mut dialog, fields)?;
            submit_patient(&client, &signed_in.user, &dialog, existing).await
        }
        PatientsSubcommand::Update { patient_id, fields } => {
            let current = client.get_patient(&patient_id).await?;
            let mut dialog = PatientDialog::edit(&current);
            apply_patient_fields(&mut dialog, fields)?;
            submit_patient(&client, &signed_in.user, &dialog, 0).await
        }
        PatientsSubcommand::Deactivate { patient_id } => print_json(&client.deactivate_patient(&patient_id).await?),
        PatientsSubcommand::Delete { patient_id } => print_json(&client.delete_patient(&patient_id).await?),
    }
}

fn apply_patient_fields(dialog: &mut PatientDialog, fields: PatientFields) -> Result<(), CliError> {
    let Some(form) = dialog.form_mut() else {
        return Ok(());
    };
    let PatientFields { name, email, phone, age, gender, address, allergies, status } = fields;
    set_text(&mut form.name, name);
    set_text(&mut form.email, email);
    set_text(&mut form.phone, phone);
    set_text(&mut form.gender, gender);
    set_text(&mut form.address, address);
    set_text(&mut form.allergies, allergies);
    if age.is_some() {
        form.age = age;
    }
    if let Some(status) = status {
        form.status = parse_patient_status(&status)?;
    }
    Ok(())
}

fn set_text(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn parse_patient_status(raw: &str) -> Result<PatientStatus, CliError> {
    match StatusFilter::parse(raw) {
        Some(StatusFilter::Only(status)) => Ok(status),
        _ => Err(CliError::InvalidArgument(format!("unknown patient status `{raw}`"))),
    }
}

async fn submit_patient(
    client: &AuthedClient<'_>,
    user: &UserProfile,
    dialog: &PatientDialog,
    existing: usize,
) -> Result<(), CliError> {
    let today = time::OffsetDateTime::now_utc().date().to_string();
    let response = match dialog.submission(&user.id, existing, &today) {
        Some(PatientSubmission::Create(record)) => {
            require_name(&record)?;
            client.add_patient(&record).await?
        }
        Some(PatientSubmission::Update { patient_id, record }) => {
            require_name(&record)?;
            client.update_patient(patient_id.as_str(), &record).await?
        }
        None => return Ok(()),
    };
    print_json(&response)
}

fn require_name(record: &Patient) -> Result<(), CliError> {
    if record.name.trim().is_empty() {
        return Err(CliError::InvalidArgument("patient name is required".to_owned()));
    }
    Ok(())
}

async fn run_notifications(signed_in: &SignedIn, command: NotificationsSubcommand) -> Result<(), CliError> {
    let client = signed_in.client();
    match command {
        NotificationsSubcommand::List => {
            let state = NotificationsState::new(client.list_notifications().await?);
            let groups = state.groups();
            print_json(&json!({
                "unread": state.unread_count(),
                "emergency_unread": state.emergency_unread_count(),
                "emergency": groups.emergency,
                "updates": groups.updates,
                "reminders": groups.reminders,
                "results": groups.results,
            }))
        }
        NotificationsSubcommand::Read { notification_id } => {
            print_json(&client.mark_notification_read(&notification_id).await?)
        }
        NotificationsSubcommand::Unread { notification_id } => {
            print_json(&client.mark_notification_unread(&notification_id).await?)
        }
        NotificationsSubcommand::Delete { notification_id } => {
            print_json(&client.delete_notification(&notification_id).await?)
        }
        NotificationsSubcommand::ReadAll => print_json(&client.mark_all_notifications_read().await?),
        NotificationsSubcommand::Clear => print_json(&client.clear_notifications().await?),
    }
}

async fn run_contexts(signed_in: &SignedIn, command: ContextsSubcommand) -> Result<(), CliError> {
    let client = signed_in.client();
    match command {
        ContextsSubcommand::List { appointment: None } => print_json(&client.list_global_contexts().await?),
        ContextsSubcommand::List { appointment: Some(appointment_id) } => {
            print_json(&client.list_local_contexts(&appointment_id).await?)
        }
        ContextsSubcommand::Add { name, description, appointment } => {
            let entry = ContextEntry { name, description, ..ContextEntry::default() };
            let response = match appointment {
                Some(appointment_id) => client.add_local_context(&appointment_id, &entry).await?,
                None => client.add_global_context(&entry).await?,
            };
            print_json(&response)
        }
        ContextsSubcommand::Delete { context_id, local } => {
            let scope = if local { ContextScope::Local } else { ContextScope::Global };
            print_json(&client.delete_context(scope, &context_id).await?)
        }
        ContextsSubcommand::Upload { path, appointment } => {
            let scope = if appointment.is_some() { ContextScope::Local } else { ContextScope::Global };
            print_json(&client.upload_context_file(&path, scope, appointment.as_deref()).await?)
        }
    }
}

async fn run_chats(signed_in: &SignedIn, command: ChatsSubcommand) -> Result<(), CliError> {
    let client = signed_in.client();
    match command {
        ChatsSubcommand::History { appointment_id } => {
            let chat = ChatState::from_history(client.chat_history(&appointment_id).await?);
            let rendered: Vec<Value> = chat
                .messages
                .iter()
                .map(|message| {
                    json!({
                        "from_doctor": is_from_doctor(message),
                        "sender": message.sender,
                        "message": message.message,
                        "timestamp": message.timestamp,
                    })
                })
                .collect();
            print_json(&rendered)
        }
        ChatsSubcommand::Send { appointment_id, message } => {
            print_json(&client.send_chat_message(&appointment_id, &message).await?)
        }
    }
}

async fn run_appointments(signed_in: &SignedIn, command: AppointmentsSubcommand) -> Result<(), CliError> {
    let client = signed_in.client();
    match command {
        AppointmentsSubcommand::List => print_json(&client.list_appointments().await?),
        AppointmentsSubcommand::Get { appointment_id } => print_json(&client.get_appointment(&appointment_id).await?),
        AppointmentsSubcommand::Create { data } => {
            let appointment = serde_json::from_str(&data)?;
            print_json(&client.create_appointment(&appointment).await?)
        }
        AppointmentsSubcommand::Update { appointment_id, data } => {
            let appointment = serde_json::from_str(&data)?;
            print_json(&client.update_appointment(&appointment_id, &appointment).await?)
        }
        AppointmentsSubcommand::Delete { appointment_id } => {
            print_json(&client.delete_appointment(&appointment_id).await?)
        }
    }
}

async fn run_profile(signed_in: &SignedIn, command: ProfileSubcommand) -> Result<(), CliError> {
    let client = signed_in.client();
    match command {
        ProfileSubcommand::Show => print_json(&signed_in.user),
        ProfileSubcommand::Update { data } => {
            let fields: Map<String, Value> = serde_json::from_str(&data)?;
            print_json(&client.update_profile(&fields).await?)
        }
        ProfileSubcommand::Avatar { path } => print_json(&client.upload_avatar(&path).await?),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
