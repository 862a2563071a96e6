mod avatar;
mod camera;
mod cli;
mod framing;
mod hud;
mod layout;
mod room;
mod scenery;
mod session;
mod viewer;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use pollster::FutureExt;
use wgpu::SurfaceError;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use avatar::FileAvatarSource;
use cli::{Args, RosterEntry};
use session::ViewerSession;
use viewer::ViewerState;

const ORBIT_STEP: f32 = 0.12;
const ZOOM_STEP: f32 = 1.12;
const DRAG_SENSITIVITY: f32 = 0.005;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    let config = args.room_config()?;
    let roster = match args.roster.as_deref() {
        Some(path) => cli::load_roster(path)?,
        None => Vec::new(),
    };
    for entry in &roster {
        log::debug!(
            "roster entry '{}' ({}) -> {}",
            entry.key,
            entry.name,
            entry.file.display()
        );
    }
    for key in &args.select {
        if !roster.iter().any(|entry| entry.key == *key) {
            bail!("--select key '{key}' is not in the roster");
        }
    }

    let source = FileAvatarSource;
    let mut session = ViewerSession::new(config.room, args.seed);

    if let Some(model) = args.model.as_deref() {
        let key = model
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("avatar")
            .to_owned();
        session.load(&key, Some(model), &source);
    } else if roster.is_empty() {
        // No model and no roster still boots the room; the missing source
        // is reported once on the HUD.
        session.load("avatar", None, &source);
    }
    let selected: Vec<(&str, &Path)> = roster
        .iter()
        .filter(|entry| args.select.contains(&entry.key))
        .map(|entry| (entry.key.as_str(), entry.file.as_path()))
        .collect();
    session.load_many(selected, &source);

    if args.headless {
        for entry in session.hud.entries() {
            println!("{}", entry.line());
        }
        println!(
            "{} avatar(s) loaded, {} scenery piece(s), room '{}'",
            session.avatar_count(),
            session.scenery().len(),
            session.room().label()
        );
        let errors = session.hud.error_count();
        if errors > 0 {
            bail!("{errors} load error(s) in headless run");
        }
        return Ok(());
    }

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(1280, 720))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let mut state = ViewerState::new(window, config, session).block_on()?;
    let mut last_frame = Instant::now();
    let mut dragging = false;
    let mut last_cursor: Option<PhysicalPosition<f64>> = None;

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key,
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => handle_key(&mut state, &roster, &logical_key, target),
                        WindowEvent::MouseInput {
                            state: button_state,
                            button: MouseButton::Left,
                            ..
                        } => {
                            dragging = button_state == ElementState::Pressed;
                            if !dragging {
                                last_cursor = None;
                            }
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            if dragging {
                                if let Some(previous) = last_cursor {
                                    let dx = (position.x - previous.x) as f32;
                                    let dy = (position.y - previous.y) as f32;
                                    state.orbit(
                                        -dx * DRAG_SENSITIVITY,
                                        -dy * DRAG_SENSITIVITY,
                                    );
                                }
                                last_cursor = Some(position);
                            }
                        }
                        WindowEvent::MouseWheel { delta, .. } => {
                            let steps = match delta {
                                MouseScrollDelta::LineDelta(_, y) => y,
                                MouseScrollDelta::PixelDelta(pos) => (pos.y / 40.0) as f32,
                            };
                            if steps.abs() > f32::EPSILON {
                                state.zoom(ZOOM_STEP.powf(-steps));
                            }
                        }
                        WindowEvent::Resized(new_size) => state.resize(new_size),
                        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                            state.set_scale_factor(scale_factor);
                        }
                        WindowEvent::RedrawRequested => {
                            let now = Instant::now();
                            let dt = now.duration_since(last_frame).as_secs_f32();
                            last_frame = now;
                            state.update(dt);
                            match state.render() {
                                Ok(_) => {}
                                Err(SurfaceError::Lost) => {
                                    state.resize(state.window().inner_size())
                                }
                                Err(SurfaceError::OutOfMemory) => target.exit(),
                                Err(err) => log::error!("render error: {err:?}"),
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => state.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}

fn handle_key(
    state: &mut ViewerState,
    roster: &[RosterEntry],
    key: &Key,
    target: &winit::event_loop::EventLoopWindowTarget<()>,
) {
    match key {
        Key::Named(NamedKey::Escape) => target.exit(),
        Key::Named(NamedKey::ArrowLeft) => state.orbit(-ORBIT_STEP, 0.0),
        Key::Named(NamedKey::ArrowRight) => state.orbit(ORBIT_STEP, 0.0),
        Key::Named(NamedKey::ArrowUp) => state.orbit(0.0, ORBIT_STEP),
        Key::Named(NamedKey::ArrowDown) => state.orbit(0.0, -ORBIT_STEP),
        Key::Character(text) => match text.as_str() {
            "-" => state.zoom(ZOOM_STEP),
            "=" | "+" => state.zoom(1.0 / ZOOM_STEP),
            "c" | "C" => state.session_mut().clear(),
            "g" | "G" => state.session_mut().toggle_layout(),
            digit @ ("1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9") => {
                let index = digit.parse::<usize>().unwrap_or(0).saturating_sub(1);
                if let Some(entry) = roster.get(index) {
                    let session = state.session_mut();
                    if session.is_loaded(&entry.key) {
                        session.remove(&entry.key);
                    } else {
                        session.load(&entry.key, Some(entry.file.as_path()), &FileAvatarSource);
                    }
                }
            }
            _ => {}
        },
        _ => {}
    }
}
