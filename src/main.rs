//! Windowed demo: simulate and render the ocean surface at interactive rates.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use swell::camera::OrbitCamera;
use swell::displacement::DisplacementSimulator;
use swell::mesh::SurfaceMesh;
use swell::params::OceanConfig;
use swell::render::{SceneUniforms, SurfaceRenderer};

#[derive(Parser, Debug)]
#[command(about = "GPU orbital-wave ocean surface demo")]
struct Args {
    /// Field texture and mesh grid resolution
    #[arg(long, default_value_t = 256)]
    resolution: u32,

    /// Wave falloff lookup table size
    #[arg(long, default_value_t = 128)]
    lookup_size: u32,

    /// Save the field textures to PNGs after the first simulated frame
    #[arg(long)]
    dump_fields: bool,
}

struct FpsTracker {
    frame_times: VecDeque<Duration>,
    last_frame: Instant,
    last_print: Instant,
}

impl FpsTracker {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_times: VecDeque::new(),
            last_frame: now,
            last_print: now,
        }
    }

    fn record_frame(&mut self) {
        let now = Instant::now();
        self.frame_times.push_back(now - self.last_frame);
        self.last_frame = now;
        if self.frame_times.len() > 60 {
            self.frame_times.pop_front();
        }

        if now - self.last_print > Duration::from_secs(1) {
            println!("FPS: {:.1}", self.current_fps());
            self.last_print = now;
        }
    }

    fn current_fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let total: Duration = self.frame_times.iter().sum();
        let avg = total.as_secs_f32() / self.frame_times.len() as f32;
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }
}

struct App {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,

    ocean: OceanConfig,
    simulator: DisplacementSimulator,
    mesh: SurfaceMesh,
    renderer: SurfaceRenderer,
    camera: OrbitCamera,

    start: Instant,
    fps_tracker: FpsTracker,
    fields_dumped: bool,
    window: Arc<Window>,
}

impl App {
    async fn new(window: Arc<Window>, ocean: OceanConfig) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut simulator = DisplacementSimulator::new(&device);
        simulator.reconfigure(&device, &queue, &ocean);

        let mut mesh = SurfaceMesh::new();
        mesh.ensure(&device, &queue, ocean.resolution);

        let mut renderer = SurfaceRenderer::new(&device, surface_format);
        renderer.resize(&device, size.width, size.height);

        Self {
            surface,
            device,
            queue,
            config,
            size,
            ocean,
            simulator,
            mesh,
            renderer,
            camera: OrbitCamera::default(),
            start: Instant::now(),
            fps_tracker: FpsTracker::new(),
            fields_dumped: false,
            window,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.renderer
                .resize(&self.device, new_size.width, new_size.height);
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let time = self.start.elapsed().as_secs_f32();

        // Simulate, then render: two ordered ticks per frame
        self.simulator
            .reconfigure(&self.device, &self.queue, &self.ocean);
        self.mesh
            .ensure(&self.device, &self.queue, self.ocean.resolution);
        self.simulator
            .step(&self.device, &self.queue, &self.ocean.waves, time);

        if self.ocean.dump_fields && !self.fields_dumped {
            self.dump_fields();
            self.fields_dumped = true;
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let aspect = self.size.width as f32 / self.size.height.max(1) as f32;
        let (view_proj, eye) = self.camera.view_proj(time, aspect);
        let scene = SceneUniforms::new(view_proj, glam::Mat4::IDENTITY, eye);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.renderer.draw(
            &self.device,
            &self.queue,
            &mut encoder,
            &view,
            &self.mesh,
            &self.simulator,
            scene,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.fps_tracker.record_frame();
        Ok(())
    }

    fn dump_fields(&self) {
        use swell::displacement::{read_texels, save_texels_png};

        let Some(field) = self.simulator.field() else {
            return;
        };
        let resolution = field.resolution();
        let position = read_texels(&self.device, &self.queue, &field.position, resolution);
        let normal = read_texels(&self.device, &self.queue, &field.normal, resolution);
        if let Err(e) = save_texels_png("field_position.png", &position, resolution)
            .and_then(|_| save_texels_png("field_normal.png", &normal, resolution))
        {
            log::error!("{e}");
        }
    }
}

struct AppState {
    app: Option<App>,
    ocean: OceanConfig,
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Swell: GPU Ocean Surface")
            .with_inner_size(winit::dpi::PhysicalSize::new(1280u32, 720u32));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());
        let app = pollster::block_on(App::new(window, self.ocean.clone()));
        self.app = Some(app);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(physical_size) => {
                if let Some(app) = &mut self.app {
                    app.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(app) = &mut self.app {
                    match app.render() {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost) => app.resize(app.size),
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => eprintln!("Render error: {:?}", e),
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(app) = &self.app {
            app.window.request_redraw();
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let ocean = OceanConfig {
        resolution: args.resolution,
        lookup_size: args.lookup_size,
        dump_fields: args.dump_fields,
        ..OceanConfig::default()
    };
    ocean.validate().expect("invalid configuration");

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app_state = AppState { app: None, ocean };
    event_loop.run_app(&mut app_state).unwrap();
}
