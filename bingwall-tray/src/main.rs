#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod library;

use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tao::event::Event;
use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{TrayIconBuilder, TrayIconEvent};

use bingwall_core::{run, set_wallpaper, task, RunConfig, Settings};
use library::WallpaperLibrary;

enum UserEvent {
    TrayIcon(tray_icon::TrayIconEvent),
    Menu(tray_icon::menu::MenuEvent),
    DownloadFinished,
}

struct TrayApp {
    settings: Settings,
    library: WallpaperLibrary,
    auto_enabled: bool,
}

impl TrayApp {
    fn new() -> Result<Self> {
        let settings = Settings::load()?;
        let library = WallpaperLibrary::new(settings.download_folder.clone());
        let auto_enabled = task::is_auto_download_enabled();
        Ok(TrayApp {
            settings,
            library,
            auto_enabled,
        })
    }

    fn status_line(&self) -> String {
        let mut status = if self.auto_enabled {
            "Auto-download: enabled".to_string()
        } else {
            "Auto-download: disabled".to_string()
        };
        if self.settings.user_paused {
            status.push_str(" (paused by selection)");
        }
        status
    }

    fn select_previous(&mut self) {
        let Some(path) = self.library.previous().map(Path::to_path_buf) else {
            return;
        };
        if let Err(e) = set_wallpaper(&path) {
            error!(error = %e, "failed to set wallpaper");
            return;
        }
        // Browsing away from the newest image pauses the automatic update.
        if !self.library.at_latest() {
            self.settings.user_paused = true;
            self.persist_selection();
        }
    }

    fn select_next(&mut self) {
        let Some(path) = self.library.next().map(Path::to_path_buf) else {
            return;
        };
        if let Err(e) = set_wallpaper(&path) {
            error!(error = %e, "failed to set wallpaper");
            return;
        }
        self.persist_selection();
    }

    fn jump_to_latest(&mut self) {
        let Some(path) = self.library.jump_to_latest().map(Path::to_path_buf) else {
            return;
        };
        if let Err(e) = set_wallpaper(&path) {
            error!(error = %e, "failed to set wallpaper");
        }
    }

    fn toggle_auto_download(&mut self) {
        let target = !self.auto_enabled;
        match task::set_auto_download(target) {
            Ok(true) => {
                self.auto_enabled = target;
                if target {
                    self.settings.user_paused = false;
                    self.persist_selection();
                }
            }
            Ok(false) => warn!("scheduled task is not available on this system"),
            Err(e) => error!(error = %e, "failed to toggle the scheduled task"),
        }
    }

    fn resume_auto_update(&mut self) {
        self.settings.user_paused = false;
        self.persist_selection();
        if !self.auto_enabled {
            if let Ok(true) = task::set_auto_download(true) {
                self.auto_enabled = true;
            }
        }
        self.jump_to_latest();
    }

    fn persist_selection(&mut self) {
        self.settings.last_manual_selection = Some(Utc::now().to_rfc3339());
        if let Err(e) = self.settings.save() {
            warn!(error = %e, "failed to save settings");
        }
    }
}

/// Runs the scheduled task when one is registered, otherwise downloads
/// in-process; fire-and-forget, the result arrives as a user event.
fn spawn_download(settings: &Settings, proxy: EventLoopProxy<UserEvent>) {
    let config = RunConfig {
        market: settings.market.clone(),
        fallback_markets: settings.fallback_market_list(),
        resolutions: settings.resolution_list(),
        output_dir: settings.download_folder.clone(),
        count: settings.image_count,
        conflict_mode: settings.file_mode,
        name_mode: settings.name_mode,
        set_latest: false,
    };
    thread::spawn(move || {
        match task::run_download_task() {
            Ok(true) => thread::sleep(Duration::from_secs(3)),
            _ => {
                if let Err(e) = run(&config) {
                    warn!(error = %e, "manual download failed");
                }
            }
        }
        let _ = proxy.send_event(UserEvent::DownloadFinished);
    });
}

fn create_tray_menu(app: &TrayApp) -> (Menu, Vec<MenuId>) {
    let menu = Menu::new();

    let status_item = MenuItem::new(app.status_line(), false, None);
    let info_item = MenuItem::new(app.library.current_info(), false, None);

    let previous_item = MenuItem::new("Previous wallpaper", !app.library.at_oldest(), None);
    let next_item = MenuItem::new("Next wallpaper", !app.library.at_latest(), None);
    let latest_item = MenuItem::new("Jump to latest", !app.library.at_latest(), None);

    let toggle_item = MenuItem::new(
        if app.auto_enabled {
            "Disable auto-download"
        } else {
            "Enable auto-download"
        },
        true,
        None,
    );
    let resume_item = MenuItem::new("Resume auto-update", app.settings.user_paused, None);
    let download_item = MenuItem::new("Download now", true, None);

    let folder_item = MenuItem::new("Open wallpaper folder", true, None);
    let refresh_item = MenuItem::new("Refresh list", true, None);
    let quit_item = MenuItem::new("Exit", true, None);

    let menu_ids = vec![
        previous_item.id().clone(),
        next_item.id().clone(),
        latest_item.id().clone(),
        toggle_item.id().clone(),
        resume_item.id().clone(),
        download_item.id().clone(),
        folder_item.id().clone(),
        refresh_item.id().clone(),
        quit_item.id().clone(),
    ];

    menu.append_items(&[
        &status_item,
        &info_item,
        &PredefinedMenuItem::separator(),
        &previous_item,
        &next_item,
        &latest_item,
        &PredefinedMenuItem::separator(),
        &toggle_item,
        &resume_item,
        &download_item,
        &PredefinedMenuItem::separator(),
        &folder_item,
        &refresh_item,
        &PredefinedMenuItem::separator(),
        &quit_item,
    ])
    .expect("failed to append menu items");

    (menu, menu_ids)
}

fn update_tray_menu(tray_icon: &tray_icon::TrayIcon, app: &TrayApp, menu_ids: &mut Vec<MenuId>) {
    let (menu, ids) = create_tray_menu(app);
    *menu_ids = ids;
    tray_icon.set_menu(Some(Box::new(menu)));
}

fn load_icon() -> tray_icon::Icon {
    // Simple programmatic icon: framed sky, sun, and a hill silhouette.
    const SIZE: u32 = 32;
    let mut rgba = vec![0u8; (SIZE * SIZE * 4) as usize];
    for y in 0..SIZE {
        for x in 0..SIZE {
            let idx = ((y * SIZE + x) * 4) as usize;
            let (r, g, b): (u8, u8, u8) = if x < 2 || x >= SIZE - 2 || y < 2 || y >= SIZE - 2 {
                (235, 235, 235)
            } else if (20..=26).contains(&x) && (6..=12).contains(&y) {
                (250, 210, 60)
            } else if y >= 22 {
                (46, 140, 60)
            } else {
                (70, 140, 220)
            };
            rgba[idx] = r;
            rgba[idx + 1] = g;
            rgba[idx + 2] = b;
            rgba[idx + 3] = 255;
        }
    }
    tray_icon::Icon::from_rgba(rgba, SIZE, SIZE).expect("failed to create icon")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut app = TrayApp::new()?;

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();

    let proxy = event_loop.create_proxy();
    TrayIconEvent::set_event_handler(Some(move |event| {
        let _ = proxy.send_event(UserEvent::TrayIcon(event));
    }));

    let proxy = event_loop.create_proxy();
    MenuEvent::set_event_handler(Some(move |event| {
        let _ = proxy.send_event(UserEvent::Menu(event));
    }));

    let download_proxy = event_loop.create_proxy();

    let mut tray_icon = None;
    let mut menu_ids: Vec<MenuId> = Vec::new();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(tao::event::StartCause::Init) => {
                let (menu, ids) = create_tray_menu(&app);
                menu_ids = ids;
                tray_icon = Some(
                    TrayIconBuilder::new()
                        .with_menu(Box::new(menu))
                        .with_tooltip("Bingwall - Bing Wallpaper Manager")
                        .with_icon(load_icon())
                        .build()
                        .expect("failed to build tray icon"),
                );
            }

            Event::UserEvent(UserEvent::Menu(event)) => {
                if !menu_ids.is_empty() {
                    if event.id == menu_ids[0] {
                        app.select_previous();
                    } else if event.id == menu_ids[1] {
                        app.select_next();
                    } else if event.id == menu_ids[2] {
                        app.jump_to_latest();
                    } else if event.id == menu_ids[3] {
                        app.toggle_auto_download();
                    } else if event.id == menu_ids[4] {
                        app.resume_auto_update();
                    } else if event.id == menu_ids[5] {
                        spawn_download(&app.settings, download_proxy.clone());
                    } else if event.id == menu_ids[6] {
                        if let Err(e) = open::that(app.library.dir()) {
                            error!(error = %e, "failed to open wallpaper folder");
                        }
                    } else if event.id == menu_ids[7] {
                        app.library.refresh();
                    } else if event.id == menu_ids[8] {
                        tray_icon.take();
                        *control_flow = ControlFlow::Exit;
                    }
                }
                if let Some(ref icon) = tray_icon {
                    update_tray_menu(icon, &app, &mut menu_ids);
                }
            }

            Event::UserEvent(UserEvent::DownloadFinished) => {
                app.library.refresh();
                if let Some(ref icon) = tray_icon {
                    update_tray_menu(icon, &app, &mut menu_ids);
                }
            }

            Event::UserEvent(UserEvent::TrayIcon(event)) => {
                tracing::debug!(?event, "tray icon event");
            }

            _ => {}
        }
    })
}
