//! Control Panel Widget
//! Left side panel with the province selector, data actions and status line.

use egui::{Color32, ComboBox, RichText};

/// Left side control panel.
pub struct ControlPanel {
    pub source: String,
    pub provinces: Vec<String>,
    pub selected: Option<String>,
    pub status: String,
    pub is_error: bool,
    pub is_busy: bool,
}

impl ControlPanel {
    pub fn new(source: String) -> Self {
        Self {
            source,
            provinces: Vec::new(),
            selected: None,
            status: "Ready".to_string(),
            is_error: false,
            is_busy: false,
        }
    }

    /// Replace the province list after a load. Keeps the current selection
    /// when it still exists, otherwise selects the first province.
    pub fn update_provinces(&mut self, provinces: Vec<String>) {
        let keep = self
            .selected
            .as_ref()
            .is_some_and(|current| provinces.contains(current));
        if !keep {
            self.selected = provinces.first().cloned();
        }
        self.provinces = provinces;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.is_error = false;
    }

    pub fn set_error(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.is_error = true;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, has_view: bool) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📘 Cambodia Education")
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(RichText::new("2020–2021").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&self.source).size(11.0).color(Color32::GRAY));
                ui.add_space(4.0);
                ui.add_enabled_ui(!self.is_busy, |ui| {
                    if ui.button("🔄 Reload").clicked() {
                        action = ControlPanelAction::Reload;
                    }
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Province Section =====
        ui.label(
            RichText::new("Select a province to view:")
                .size(14.0)
                .strong(),
        );
        ui.add_space(5.0);

        let selected_text = self.selected.clone().unwrap_or_default();
        ui.add_enabled_ui(!self.provinces.is_empty(), |ui| {
            ComboBox::from_id_salt("province")
                .width(220.0)
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for province in &self.provinces {
                        let is_selected = self.selected.as_deref() == Some(province.as_str());
                        if ui.selectable_label(is_selected, province).clicked() && !is_selected {
                            self.selected = Some(province.clone());
                            action = ControlPanelAction::ProvinceChanged;
                        }
                    }
                });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Section =====
        ui.label(RichText::new("📤 Export").size(14.0).strong());
        ui.add_space(5.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!self.provinces.is_empty(), |ui| {
                let button = egui::Button::new(RichText::new("Dataset as CSV").size(13.0))
                    .min_size(egui::vec2(180.0, 28.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportCsv;
                }
            });
            ui.add_space(4.0);
            ui.add_enabled_ui(has_view, |ui| {
                let button = egui::Button::new(RichText::new("View as JSON").size(13.0))
                    .min_size(egui::vec2(180.0, 28.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportJson;
                }
                ui.add_space(4.0);
                let button = egui::Button::new(RichText::new("Charts as PNG").size(13.0))
                    .min_size(egui::vec2(180.0, 28.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        if self.is_busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new(&self.status).size(11.0));
            });
        } else {
            let color = if self.is_error {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(color));
        }

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    ProvinceChanged,
    Reload,
    ExportCsv,
    ExportJson,
    ExportPng,
}
