#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod blend_space;
pub mod geom;
pub mod graph;
pub mod motion;
pub mod parse;
pub mod pose;

use std::fmt;
use std::sync::Arc;

use blend_space::{CurrentLocation, ConfigIssue, BlendSpaceManager};
use geom::GeometryDiagnostics;
use glam::{Vec2, Vec3};
use graph::AnimGraph;
use graph::frame::{self, FrameOutput};
use graph::instance::{AnimGraphContext, AnimGraphInstance};
use graph::node::AnimGraphNode;
use motion::{EmittedEvent, InMemoryMotionSet, KeyframedMotion};
use pose::Skeleton;
use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("kon rayon threadpool niet initialiseren: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

#[derive(Debug, Serialize)]
struct WeightExport {
    motion_id: String,
    weight: f32,
}

#[derive(Debug, Serialize)]
struct DiagnosticsExport<'a> {
    dimensions: usize,
    geometry: &'a GeometryDiagnostics,
    issues: Vec<String>,
}

/// Interactieve preview van één blend space, bedoeld voor editors.
#[wasm_bindgen]
pub struct BlendSpacePreview {
    ctx: AnimGraphContext,
    graph: Option<AnimGraph>,
    skeleton: Arc<Skeleton>,
    motions: InMemoryMotionSet,
    instance: Option<AnimGraphInstance>,
    last_frame: Option<FrameOutput>,
}

impl Default for BlendSpacePreview {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl BlendSpacePreview {
    #[wasm_bindgen(constructor)]
    pub fn new() -> BlendSpacePreview {
        BlendSpacePreview {
            ctx: AnimGraphContext::new(BlendSpaceManager::default()),
            graph: None,
            skeleton: Arc::new(Skeleton::chain(1)),
            motions: InMemoryMotionSet::new(),
            instance: None,
            last_frame: None,
        }
    }

    /// Laad blend-space definities; de eerste definitie wordt getoond.
    #[wasm_bindgen]
    pub fn load_definition(&mut self, xml: &str) -> Result<(), JsValue> {
        let graph = parse::blend_space_xml::parse_graph(xml).map_err(to_js_error)?;
        graph.root_node().map_err(to_js_error)?;

        self.drop_instance();
        self.graph = Some(graph);
        Ok(())
    }

    /// Registreer een motion zonder wortelbeweging.
    #[wasm_bindgen]
    pub fn add_motion(&mut self, id: &str, duration: f32) -> Result<(), JsValue> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(js_error("duur moet een eindig, niet-negatief getal zijn"));
        }
        self.insert_motion(KeyframedMotion::new(id, duration));
        Ok(())
    }

    /// Registreer een motion die met constante snelheid beweegt en draait.
    #[wasm_bindgen]
    pub fn add_locomotion_motion(
        &mut self,
        id: &str,
        duration: f32,
        velocity_x: f32,
        velocity_y: f32,
        turn_rate: f32,
    ) -> Result<(), JsValue> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(js_error("duur moet een eindig, niet-negatief getal zijn"));
        }
        let velocity = Vec3::new(velocity_x, velocity_y, 0.0);
        self.insert_motion(KeyframedMotion::locomotion(id, duration, velocity, turn_rate));
        Ok(())
    }

    /// Zet de interactieve positie van de blend space.
    #[wasm_bindgen]
    pub fn set_position(&mut self, x: f32, y: f32) -> Result<(), JsValue> {
        if !x.is_finite() || !y.is_finite() {
            return Err(js_error("positie moet uit eindige getallen bestaan"));
        }
        let (graph, instance) = self.prepared().map_err(|err| js_error(&err))?;
        let root = graph.root_node().map_err(to_js_error)?;
        root.set_current_position(instance, Vec2::new(x, y));
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_parameter(&mut self, name: &str, value: f32) -> Result<(), JsValue> {
        let (_, instance) = self.prepared().map_err(|err| js_error(&err))?;
        instance.set_parameter(name, value);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_vector_parameter(&mut self, name: &str, x: f32, y: f32) -> Result<(), JsValue> {
        let (_, instance) = self.prepared().map_err(|err| js_error(&err))?;
        instance.set_parameter(name, Vec2::new(x, y));
        Ok(())
    }

    /// Evalueer één frame van `time_passed` seconden.
    #[wasm_bindgen]
    pub fn evaluate(&mut self, time_passed: f32) -> Result<(), JsValue> {
        self.step(time_passed).map(|_| ()).map_err(|err| js_error(&err))
    }

    #[wasm_bindgen]
    pub fn rewind(&mut self) -> Result<(), JsValue> {
        let (graph, instance) = self.prepared().map_err(|err| js_error(&err))?;
        frame::rewind(graph, instance);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn get_weights(&self) -> Result<JsValue, JsValue> {
        let weights: Vec<WeightExport> = self
            .weights()
            .into_iter()
            .map(|(motion_id, weight)| WeightExport { motion_id, weight })
            .collect();
        serde_wasm_bindgen::to_value(&weights).map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn get_location(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.location()).map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn get_events(&self) -> Result<JsValue, JsValue> {
        let events: Vec<&EmittedEvent> = self
            .last_frame
            .as_ref()
            .map(|frame| frame.events.iter().collect())
            .unwrap_or_default();
        serde_wasm_bindgen::to_value(&events).map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        let graph = self
            .graph
            .as_ref()
            .ok_or_else(|| js_error("er is geen blend space geladen"))?;
        let root = graph.root_node().map_err(to_js_error)?;
        let data = self
            .instance
            .as_ref()
            .and_then(|instance| instance.unique_data(root.id()));

        let empty = GeometryDiagnostics::default();
        let mut issues: Vec<String> = root
            .validate(Some(&self.motions), self.ctx.manager())
            .iter()
            .map(ToString::to_string)
            .collect();
        for issue in data.iter().flat_map(|data| data.issues.iter()) {
            let message = issue.to_string();
            if !issues.contains(&message) {
                issues.push(message);
            }
        }

        let export = DiagnosticsExport {
            dimensions: root.dimensions(),
            geometry: data.map_or(&empty, |data| &data.diagnostics),
            issues,
        };
        serde_wasm_bindgen::to_value(&export).map_err(|err| JsError::new(&err.to_string()).into())
    }
}

impl BlendSpacePreview {
    /// Gewichten per motion na het laatste frame.
    #[must_use]
    pub fn weights(&self) -> Vec<(String, f32)> {
        self.root_data(|data| data.weights()).unwrap_or_default()
    }

    #[must_use]
    pub fn location(&self) -> CurrentLocation {
        self.root_data(|data| data.location).unwrap_or_default()
    }

    /// Configuratieproblemen van de getoonde blend space.
    #[must_use]
    pub fn issues(&self) -> Vec<ConfigIssue> {
        self.graph
            .as_ref()
            .and_then(|graph| graph.root_node().ok())
            .map(|root| root.validate(Some(&self.motions), self.ctx.manager()))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&FrameOutput> {
        self.last_frame.as_ref()
    }

    /// Vervangt het skelet; de instantie wordt opnieuw opgebouwd.
    pub fn set_skeleton(&mut self, skeleton: Skeleton) {
        self.drop_instance();
        self.skeleton = Arc::new(skeleton);
    }

    /// Evalueert één frame.
    pub fn step(&mut self, time_passed: f32) -> Result<&FrameOutput, String> {
        if !time_passed.is_finite() {
            return Err("tijdstap moet een eindig getal zijn".to_owned());
        }
        let ctx = &self.ctx;
        let (graph, instance) = Self::prepare(
            self.graph.as_ref(),
            &mut self.instance,
            ctx,
            &self.skeleton,
            &self.motions,
        )?;
        let output = frame::evaluate_frame(graph, instance, ctx, time_passed).map_err(|err| err.to_string())?;
        Ok(self.last_frame.insert(output))
    }

    fn insert_motion(&mut self, motion: KeyframedMotion) {
        self.motions.insert(Arc::new(motion));
        if let (Some(graph), Some(instance)) = (self.graph.as_ref(), self.instance.as_mut()) {
            instance.set_motion_set(Arc::new(self.motions.clone()));
            graph.on_motion_set_changed(instance);
        }
    }

    fn root_data<T>(&self, read: impl FnOnce(&blend_space::BlendSpaceUniqueData) -> T) -> Option<T> {
        let root = self.graph.as_ref()?.root_node().ok()?;
        self.instance.as_ref()?.unique_data(root.id()).map(read)
    }

    fn prepared(&mut self) -> Result<(&AnimGraph, &mut AnimGraphInstance), String> {
        Self::prepare(
            self.graph.as_ref(),
            &mut self.instance,
            &self.ctx,
            &self.skeleton,
            &self.motions,
        )
    }

    fn prepare<'a>(
        graph: Option<&'a AnimGraph>,
        instance: &'a mut Option<AnimGraphInstance>,
        ctx: &AnimGraphContext,
        skeleton: &Arc<Skeleton>,
        motions: &InMemoryMotionSet,
    ) -> Result<(&'a AnimGraph, &'a mut AnimGraphInstance), String> {
        let graph = graph.ok_or_else(|| "er is geen blend space geladen".to_owned())?;
        let instance = instance.get_or_insert_with(|| {
            let mut created = ctx.create_instance(skeleton.clone(), Arc::new(motions.clone()));
            for node in graph.nodes() {
                node.init(&mut created, ctx);
            }
            created
        });
        Ok((graph, instance))
    }

    fn drop_instance(&mut self) {
        if let (Some(graph), Some(instance)) = (self.graph.as_ref(), self.instance.take()) {
            graph.remove_instance(instance);
        }
        self.instance = None;
        self.last_frame = None;
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
