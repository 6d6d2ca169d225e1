//! Script compilation and handler binding.
//!
//! A behavior script is plain Rhai source attached to one scene object. Its
//! top-level `fn` definitions are the behavior record: functions named after
//! a channel (`init`, `update`, `pointerdown`, ...) become handlers for that
//! channel; any other top-level function name produces a warning and is
//! dropped. Helpers belong in closures bound with `let`.
//!
//! The top level of the script runs once at compile time with `scene` and
//! `camera` seeded into scope; `let` state declared there persists across
//! handler calls. Compile and top-level evaluation failures are load-time
//! faults and propagate to the loader. Inside every handler, `this` is the
//! target scene object.

use std::cell::RefCell;
use std::rc::Rc;

use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};

use crate::channel::Channel;
use crate::diagnostics::{from_eval_error, from_parse_error, ScriptDiagnostic, ScriptPhase};
use crate::event_bus::{Event, EventBus};
use crate::scene::ObjectHandle;
use crate::script_api::{register_api, ScriptApi};

/// One channel handler produced by compilation: the script function's
/// channel slot and its declared arity (0 = ignores the event payload).
#[derive(Debug, Clone, Copy)]
struct HandlerSlot {
    channel: Channel,
    arity: usize,
}

/// The result of compiling one script against one target object.
///
/// Holds the compiled AST, the script's persistent scope, and the validated
/// channel slots in declaration order.
#[derive(Debug)]
pub struct CompiledBehavior {
    ast: Rc<AST>,
    scope: Rc<RefCell<Scope<'static>>>,
    target: ObjectHandle,
    slots: Vec<HandlerSlot>,
}

impl CompiledBehavior {
    /// Channels this behavior handles, in declaration order.
    pub fn channels(&self) -> Vec<Channel> {
        self.slots.iter().map(|s| s.channel).collect()
    }
}

/// Compiles scripts and feeds their handlers into the event bus.
pub struct ScriptHost {
    engine: Rc<Engine>,
}

impl ScriptHost {
    pub fn new() -> Self {
        let mut engine = Engine::new();

        // Engine resource limits: generous enough for real behaviors, tight
        // enough that a runaway handler cannot stall the frame loop.
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(64);
        engine.set_max_operations(100_000);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(1_000);
        engine.set_max_map_size(500);

        register_api(&mut engine);

        Self {
            engine: Rc::new(engine),
        }
    }

    /// Compile one script bound to `target`.
    ///
    /// Parse errors and top-level runtime errors are returned as
    /// [`ScriptDiagnostic`]s; the caller treats them as fatal to the load.
    /// Unknown handler names are non-fatal: warned and dropped.
    pub fn compile(
        &self,
        source: &str,
        target: ObjectHandle,
        api: &ScriptApi,
    ) -> Result<CompiledBehavior, ScriptDiagnostic> {
        let ast = self.engine.compile(source).map_err(|e| from_parse_error(&e))?;

        let mut scope = Scope::new();
        scope.push("scene", api.scene.clone());
        scope.push("camera", api.camera.clone());

        // Run the top level once to initialize script state.
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| from_eval_error(ScriptPhase::Eval, &e))?;

        // The AST's function iterator yields hash order; recover declaration
        // order from the source text so slots are stable across runs.
        let mut slots = Vec::new();
        for info in ast.iter_functions() {
            match Channel::from_name(info.name) {
                Some(channel) if info.params.len() <= 1 => {
                    slots.push((
                        declaration_offset(source, info.name),
                        HandlerSlot {
                            channel,
                            arity: info.params.len(),
                        },
                    ));
                }
                Some(channel) => {
                    log::warn!(
                        "handler '{}' on object '{}' takes {} parameters (at most 1 supported), dropped",
                        channel,
                        target.name(),
                        info.params.len()
                    );
                }
                None => {
                    log::warn!(
                        "event channel not supported ('{}'), dropped from script on object '{}'",
                        info.name,
                        target.name()
                    );
                }
            }
        }

        slots.sort_by_key(|(offset, _)| *offset);

        Ok(CompiledBehavior {
            ast: Rc::new(ast),
            scope: Rc::new(RefCell::new(scope)),
            target,
            slots: slots.into_iter().map(|(_, slot)| slot).collect(),
        })
    }

    /// Register every handler of `behavior` into the bus, in declaration
    /// order. Each handler call binds `this` to the behavior's target.
    pub fn bind(&self, behavior: &CompiledBehavior, bus: &mut EventBus) {
        for slot in &behavior.slots {
            let engine = Rc::clone(&self.engine);
            let ast = Rc::clone(&behavior.ast);
            let scope = Rc::clone(&behavior.scope);
            let target = behavior.target.clone();
            let name = slot.channel.name();
            let arity = slot.arity;

            bus.register(
                slot.channel,
                Box::new(move |event: &Event| {
                    let mut scope = scope.borrow_mut();
                    let mut this = Dynamic::from(target.clone());
                    let options = CallFnOptions::new()
                        .eval_ast(false)
                        .rewind_scope(true)
                        .bind_this_ptr(&mut this);

                    let result: Result<Dynamic, _> = if arity == 0 {
                        engine.call_fn_with_options(options, &mut scope, &ast, name, ())
                    } else {
                        engine.call_fn_with_options(
                            options,
                            &mut scope,
                            &ast,
                            name,
                            (event.to_rhai(),),
                        )
                    };

                    // Handler return values are ignored; only failures surface.
                    result
                        .map(|_| ())
                        .map_err(|e| from_eval_error(ScriptPhase::Handler, &e))
                }),
            );
        }
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset of the `fn <name>(` declaration in `source`.
///
/// Matches are accepted only when the name is preceded by the `fn` keyword
/// and followed by `(`, so mentions inside strings or comments that lack
/// that shape do not shadow the real declaration.
fn declaration_offset(source: &str, name: &str) -> usize {
    let mut from = 0;
    while let Some(found) = source[from..].find(name) {
        let at = from + found;
        let head = source[..at].trim_end();
        let tail = source[at + name.len()..].trim_start();
        let keyword = head.ends_with("fn")
            && !head[..head.len() - 2]
                .ends_with(|c: char| c.is_alphanumeric() || c == '_');
        if keyword && tail.starts_with('(') {
            return at;
        }
        from = at + name.len();
    }
    usize::MAX
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, CameraHandle};
    use crate::diagnostics::ScriptDiagnosticKind;
    use crate::scene::{ObjectData, Scene, SceneHandle};

    fn test_api() -> (ScriptApi, ObjectHandle) {
        let object = ObjectHandle::new(ObjectData::new("uuid-1", "cube"));
        let mut scene = Scene::new();
        scene.add(object.clone());
        let api = ScriptApi {
            scene: SceneHandle::new(scene),
            camera: CameraHandle::new(Camera::new()),
        };
        (api, object)
    }

    #[test]
    fn test_compile_collects_channel_handlers() {
        let host = ScriptHost::new();
        let (api, object) = test_api();

        let behavior = host
            .compile(
                r#"
                    fn init() {}
                    fn update(ev) {}
                "#,
                object,
                &api,
            )
            .unwrap();

        assert_eq!(behavior.channels(), vec![Channel::Init, Channel::Update]);
    }

    #[test]
    fn test_slots_keep_declaration_order() {
        let host = ScriptHost::new();
        let (api, object) = test_api();

        let behavior = host
            .compile(
                r#"
                    fn update(ev) {}
                    fn keydown(ev) {}
                    fn init() {}
                    fn stop() {}
                "#,
                object,
                &api,
            )
            .unwrap();

        assert_eq!(
            behavior.channels(),
            vec![Channel::Update, Channel::KeyDown, Channel::Init, Channel::Stop]
        );
    }

    #[test]
    fn test_unknown_handler_name_dropped() {
        let host = ScriptHost::new();
        let (api, object) = test_api();

        // "foo" is warned about and dropped; "update" survives.
        let behavior = host
            .compile(
                r#"
                    fn foo(ev) {}
                    fn update(ev) {}
                "#,
                object,
                &api,
            )
            .unwrap();

        assert_eq!(behavior.channels(), vec![Channel::Update]);
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let host = ScriptHost::new();
        let (api, object) = test_api();

        let err = host.compile("fn update(ev) { let x = ; }", object, &api).unwrap_err();
        assert_eq!(err.kind, ScriptDiagnosticKind::ParseError);
        assert_eq!(err.phase, ScriptPhase::Compile);
    }

    #[test]
    fn test_top_level_error_is_fatal() {
        let host = ScriptHost::new();
        let (api, object) = test_api();

        let err = host
            .compile("undefined_variable += 1;", object, &api)
            .unwrap_err();
        assert_eq!(err.phase, ScriptPhase::Eval);
    }

    #[test]
    fn test_handler_bound_to_target_object() {
        let host = ScriptHost::new();
        let (api, object) = test_api();

        let behavior = host
            .compile(
                "fn update(ev) { this.position.x = ev.time; }",
                object.clone(),
                &api,
            )
            .unwrap();

        let mut bus = EventBus::new();
        host.bind(&behavior, &mut bus);

        bus.dispatch(Channel::Update, &Event::Update { time: 7.0, delta: 0.0 })
            .unwrap();
        assert_eq!(object.borrow().transform.position.x, 7.0);
    }

    #[test]
    fn test_top_level_state_persists_across_calls() {
        let host = ScriptHost::new();
        let (api, object) = test_api();

        let behavior = host
            .compile(
                r#"
                    let calls = 0;
                    fn update(ev) {
                        calls += 1;
                        this.position.y = calls * 1.0;
                    }
                "#,
                object.clone(),
                &api,
            )
            .unwrap();

        let mut bus = EventBus::new();
        host.bind(&behavior, &mut bus);

        let tick = Event::Update { time: 0.0, delta: 0.0 };
        bus.dispatch(Channel::Update, &tick).unwrap();
        bus.dispatch(Channel::Update, &tick).unwrap();
        assert_eq!(object.borrow().transform.position.y, 2.0);
    }

    #[test]
    fn test_zero_arity_handler_supported() {
        let host = ScriptHost::new();
        let (api, object) = test_api();

        let behavior = host
            .compile(
                "fn init() { this.visible = false; }",
                object.clone(),
                &api,
            )
            .unwrap();

        let mut bus = EventBus::new();
        host.bind(&behavior, &mut bus);
        bus.dispatch(Channel::Init, &Event::Lifecycle).unwrap();
        assert!(!object.borrow().visible);
    }

    #[test]
    fn test_handler_runtime_error_surfaces_as_diagnostic() {
        let host = ScriptHost::new();
        let (api, object) = test_api();

        let behavior = host
            .compile("fn update(ev) { this.no_such_property = 1; }", object, &api)
            .unwrap();

        let mut bus = EventBus::new();
        host.bind(&behavior, &mut bus);

        let err = bus
            .dispatch(Channel::Update, &Event::Update { time: 0.0, delta: 0.0 })
            .unwrap_err();
        assert_eq!(err.phase, ScriptPhase::Handler);
    }
}
