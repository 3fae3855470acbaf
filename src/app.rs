//! Crop recommendation form, an egui/eframe application.
//!
//! # Architecture
//!
//! [`CropAdvisorApp`] is the top-level [`eframe::App`].  When the trained
//! artifacts loaded it owns a [`Session`] and two channel endpoints:
//!
//! * `command_tx`: sends [`SessionCommand`]s to the background worker.
//! * `event_rx`  : receives [`SessionEvent`]s, drained every frame.
//!
//! When they did not load, the app shows the load error instead of the form.
//!
//! # Layout
//!
//! | Row | Widgets |
//! |-----|---------|
//! | Soil / Season / Irrigation | combo box + 🎤 button |
//! | Water usage | numeric entry (≥ 0) + 🎤 button |
//! | Predict | button, spinner while thinking |
//! | Status | info / success / error line |
//! | Result | typed-out recommendation, then confirmation |

use std::time::{Duration, Instant};

use eframe::egui;
use tokio::sync::mpsc;

use crate::collect::FormField;
use crate::model::Field;
use crate::pipeline::{Notice, Session, SessionCommand, SessionEvent, SessionPhase};

const TITLE: &str = "🌾 AI Crop Recommendation";

const WELCOME: &str = "Hello! I'm here to recommend the best crop for you.\n\
    Enter the soil type, season, irrigation type and water usage, and I'll \
    suggest the best crop for your land.\n\
    You can either select manually or use voice input (click the 🎤 buttons).";

const INFO: egui::Color32 = egui::Color32::from_rgb(68, 136, 255);
const SUCCESS: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);
const ERROR: egui::Color32 = egui::Color32::from_rgb(255, 136, 68);

// ---------------------------------------------------------------------------
// FormView
// ---------------------------------------------------------------------------

/// The working form: session plus its worker channels.
pub struct FormView {
    session: Session,
    voice_enabled: bool,
    command_tx: mpsc::Sender<SessionCommand>,
    event_rx: mpsc::Receiver<SessionEvent>,
}

impl FormView {
    pub fn new(
        session: Session,
        voice_enabled: bool,
        command_tx: mpsc::Sender<SessionCommand>,
        event_rx: mpsc::Receiver<SessionEvent>,
    ) -> Self {
        Self {
            session,
            voice_enabled,
            command_tx,
            event_rx,
        }
    }

    /// Drain all pending worker events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.session.apply(event, Instant::now());
        }
    }

    fn send(&self, command: Option<SessionCommand>) {
        let Some(command) = command else { return };
        if let Err(e) = self.command_tx.try_send(command) {
            log::error!("session worker unavailable: {e}");
        }
    }

    fn draw(&mut self, ui: &mut egui::Ui) {
        ui.heading(TITLE);
        ui.add_space(4.0);
        ui.label(WELCOME);
        ui.add_space(12.0);

        egui::Grid::new("crop-form")
            .num_columns(3)
            .spacing([12.0, 10.0])
            .show(ui, |ui| {
                for field in Field::INPUTS {
                    self.draw_category_row(ui, field);
                    ui.end_row();
                }
                self.draw_water_row(ui);
                ui.end_row();
            });

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            let predict = ui.add_enabled(
                !self.session.is_busy(),
                egui::Button::new(egui::RichText::new("🧑‍🌾 Predict Crop").size(15.0)),
            );
            if predict.clicked() {
                let command = self.session.start_predict();
                self.send(command);
            }
            match self.session.phase() {
                SessionPhase::Thinking => {
                    ui.add(egui::Spinner::new());
                    ui.label("Thinking...");
                }
                SessionPhase::Listening(field) => {
                    ui.add(egui::Spinner::new());
                    ui.label(format!("Listening for {field}..."));
                }
                _ => {}
            }
        });

        ui.add_space(8.0);
        self.draw_notice(ui);
        self.draw_result(ui);
    }

    fn draw_category_row(&mut self, ui: &mut egui::Ui, field: Field) {
        ui.label(format!("Select {}", field.label()));

        let options = self.session.collector().options(field).to_vec();
        let current = self
            .session
            .collector()
            .fields()
            .category(field)
            .unwrap_or_default()
            .to_string();
        let mut chosen = current.clone();

        egui::ComboBox::from_id_salt(field.artifact_key())
            .selected_text(current.as_str())
            .width(180.0)
            .show_ui(ui, |ui| {
                for option in &options {
                    ui.selectable_value(&mut chosen, option.clone(), option.as_str());
                }
            });

        if chosen != current {
            if let Err(e) = self.session.collector_mut().select(field, &chosen) {
                log::error!("combo box offered an unknown option: {e}");
            }
        }

        self.draw_mic_button(ui, FormField::Category(field));
    }

    fn draw_water_row(&mut self, ui: &mut egui::Ui) {
        ui.label("Enter Water Usage (cubic meters)");

        let mut water = self.session.collector().fields().water_usage;
        let edited = ui.add(
            egui::DragValue::new(&mut water)
                .range(0.0..=f64::MAX)
                .speed(1.0)
                .max_decimals(2),
        );
        if edited.changed() {
            if let Err(e) = self.session.collector_mut().set_water_usage(water) {
                log::warn!("water usage entry rejected: {e}");
            }
        }

        self.draw_mic_button(ui, FormField::WaterUsage);
    }

    fn draw_mic_button(&mut self, ui: &mut egui::Ui, field: FormField) {
        if !self.voice_enabled {
            ui.label("");
            return;
        }
        let button = ui
            .add_enabled(!self.session.is_busy(), egui::Button::new("🎤 Speak"))
            .on_hover_text(format!("Speak {field}"));
        if button.clicked() {
            let command = self.session.start_listen(field);
            self.send(command);
        }
    }

    fn draw_notice(&self, ui: &mut egui::Ui) {
        let Some(notice) = self.session.notice() else {
            return;
        };
        let (prefix, color) = match notice {
            Notice::Info(_) => ("ℹ", INFO),
            Notice::Success(_) => ("✔", SUCCESS),
            Notice::Error(_) => ("❌", ERROR),
        };
        ui.label(egui::RichText::new(format!("{prefix} {}", notice.text())).color(color));
    }

    fn draw_result(&self, ui: &mut egui::Ui) {
        let now = Instant::now();
        let Some(text) = self.session.revealed(now) else {
            return;
        };
        ui.add_space(8.0);
        egui::Frame::new()
            .fill(ui.visuals().faint_bg_color)
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(10))
            .show(ui, |ui| {
                ui.label(egui::RichText::new(format!("🌱 {text}")).size(15.0));
            });
        if let Some(confirmation) = self.session.confirmation(now) {
            ui.add_space(6.0);
            ui.label(egui::RichText::new(confirmation).color(SUCCESS).strong());
        }
    }

    /// Whether the next frame should come without user input.
    fn animating(&self) -> bool {
        self.session.is_busy()
            || (self.session.phase() == SessionPhase::Result
                && !self.session.reveal_complete(Instant::now()))
    }
}

// ---------------------------------------------------------------------------
// CropAdvisorApp
// ---------------------------------------------------------------------------

enum Screen {
    Form(Box<FormView>),
    /// Artifacts failed to load; the message explains why.
    Failed(String),
}

/// eframe application for the crop recommendation form.
pub struct CropAdvisorApp {
    screen: Screen,
}

impl CropAdvisorApp {
    pub fn new(form: FormView) -> Self {
        Self {
            screen: Screen::Form(Box::new(form)),
        }
    }

    /// An app that only explains why the form is unavailable.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            screen: Screen::Failed(message.into()),
        }
    }
}

fn draw_failed(ui: &mut egui::Ui, message: &str) {
    ui.heading(TITLE);
    ui.add_space(12.0);
    ui.label(
        egui::RichText::new("The trained model files could not be loaded.")
            .color(ERROR)
            .strong(),
    );
    ui.add_space(4.0);
    ui.label(egui::RichText::new(message).monospace());
    ui.add_space(8.0);
    ui.label(
        "Place label_encoders.json, scaler.json and crop_model.json in the \
         artifacts directory (see settings.toml) and restart.",
    );
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for CropAdvisorApp {
    /// Called every frame by eframe.  Polls the worker, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match &mut self.screen {
            Screen::Failed(message) => {
                egui::CentralPanel::default().show(ctx, |ui| draw_failed(ui, message));
            }
            Screen::Form(form) => {
                form.poll_events();

                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| form.draw(ui));
                });

                if form.animating() {
                    // ~30 fps for the spinner and the typing reveal
                    ctx.request_repaint_after(Duration::from_millis(33));
                }
            }
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("crop advisor closing");
    }
}
