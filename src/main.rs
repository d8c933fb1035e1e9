use glam::{Vec2, Vec3};
use tracing::{error, info, warn};

// Import from the library crate
use roomsim::{config, controller, logging, model};

use config::RoomConfig;
use controller::{DeviceProfile, FrameLoopContext, InputEvent};
use model::{ManualLoader, RoomLayout};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FRAME_DT: f32 = 1.0 / 60.0;
const FRAMES: u32 = 300;
/// Frames before each modeled asset "arrives".
const LOAD_LATENCY: u32 = 5;

/// One scripted input, fired before the given frame.
struct Cue {
    frame: u32,
    action: Action,
}

enum Action {
    Event(InputEvent),
    /// Click wherever the named entity currently appears on screen.
    ClickOn(&'static str),
}

fn script() -> Vec<Cue> {
    let event = |frame, event| Cue {
        frame,
        action: Action::Event(event),
    };
    vec![
        Cue {
            frame: 20,
            action: Action::ClickOn("roboticVaccum"),
        },
        event(30, InputEvent::PointerLockChanged { locked: true }),
        event(40, InputEvent::KeyDown("KeyW".into())),
        event(80, InputEvent::KeyUp("KeyW".into())),
        event(90, InputEvent::PointerMove { dx: 60.0, dy: 0.0 }),
        event(120, InputEvent::PointerMove { dx: -60.0, dy: 0.0 }),
        event(130, InputEvent::Click { x: 0.0, y: 0.0 }),
        event(140, InputEvent::KeyDown("KeyA".into())),
        event(150, InputEvent::KeyDown("KeyS".into())),
        event(170, InputEvent::FocusLost),
        event(200, InputEvent::PointerLockChanged { locked: false }),
    ]
}

/// Screen position of an entity's node, through the current camera.
fn screen_point(ctx: &FrameLoopContext, name: &str) -> Option<Vec2> {
    let entity = ctx.registry.by_name(name)?;
    let node = ctx.scene.get(entity.visual?)?;
    let ndc = ctx.camera.view_proj().project_point3(node.position);
    let (width, height) = ctx.viewport();
    Some(Vec2::new(
        (ndc.x + 1.0) / 2.0 * width as f32,
        (1.0 - ndc.y) / 2.0 * height as f32,
    ))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = RoomConfig::default();
    let layout = RoomLayout::default_room(&config.fixtures);
    let mut loader = ManualLoader::with_latency(LOAD_LATENCY);
    let mut ctx = FrameLoopContext::from_layout(config, &layout, &mut loader, DeviceProfile::Pointer, WIDTH, HEIGHT)?;

    // Face the lamp from the spawn point.
    ctx.camera.set_look_at(Vec3::new(0.0, 1.3, -1.7));

    let mut cues = script().into_iter().peekable();
    for frame in 0..FRAMES {
        while let Some(cue) = cues.next_if(|cue| cue.frame == frame) {
            let event = match cue.action {
                Action::Event(event) => event,
                Action::ClickOn(name) => match screen_point(&ctx, name) {
                    Some(at) => InputEvent::Click { x: at.x, y: at.y },
                    None => {
                        warn!(entity = name, "not on screen yet, click skipped");
                        continue;
                    }
                },
            };
            if let Some(hit) = ctx.handle_event(&event) {
                info!(frame, entity = %hit.name, powered = hit.powered, "interaction");
            }
        }

        loader.advance_frame();
        let report = ctx.advance(FRAME_DT);

        if report.bound > 0 {
            info!(frame, bound = report.bound, "assets arrived");
        }
        if frame % 60 == 59 {
            let player = ctx.player_position().unwrap_or_default();
            let (yaw, pitch) = ctx.camera.yaw_pitch();
            info!(
                second = (frame + 1) / 60,
                mode = ?report.mode,
                substeps = report.step.substeps,
                synced = report.step.synced,
                player = ?player,
                yaw,
                pitch,
                "tick summary"
            );
        }
    }

    let snapshot = ctx.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        error!(%err, "headless run failed");
        std::process::exit(1);
    }
}
