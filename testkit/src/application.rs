//! Application configuration: handlers, their routes and the message kinds
//! derived from them.
//!
//! An [`Application`] describes itself to a configurer. The resulting
//! [`ApplicationConfig`] is the static view of the application the harness
//! uses to validate expectations and actions, and to explain failures.

use std::collections::{HashMap, HashSet};

use crate::{
    Error, Handler, HandlerIdentity, HandlerType, Message, MessageKind, MessageType, Result,
    compare::{TypeDistance, type_distance},
};

/// The application under test.
///
/// `configure` may be called more than once (the engine rebuilds handlers on
/// reset), so it must register fresh handler instances every time.
///
/// # Example
///
/// ```rust,ignore
/// struct Bank;
///
/// impl Application for Bank {
///     fn configure(&self, c: &mut ApplicationConfigurer) {
///         c.identity("bank");
///         c.register_aggregate(Account::default());
///         c.register_process(Transfer::default());
///     }
/// }
/// ```
pub trait Application: Send + Sync + 'static {
    fn configure(&self, c: &mut ApplicationConfigurer);
}

/// Whether a route brings messages into a handler or carries them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// A message type a handler consumes or produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub message_type: MessageType,
    pub kind: MessageKind,
    pub direction: Direction,
}

/// Collects handler registrations while an [`Application`] configures itself.
pub struct ApplicationConfigurer {
    identity: Option<String>,
    entries: Vec<(HandlerConfig, Box<dyn Handler>)>,
    errors: Vec<String>,
}

impl ApplicationConfigurer {
    fn new() -> Self {
        Self {
            identity: None,
            entries: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn identity(&mut self, name: &str) -> &mut Self {
        self.identity = Some(name.to_owned());
        self
    }

    pub fn register_aggregate(&mut self, handler: impl Handler) -> &mut Self {
        self.register(HandlerType::Aggregate, handler)
    }

    pub fn register_process(&mut self, handler: impl Handler) -> &mut Self {
        self.register(HandlerType::Process, handler)
    }

    pub fn register_integration(&mut self, handler: impl Handler) -> &mut Self {
        self.register(HandlerType::Integration, handler)
    }

    pub fn register_projection(&mut self, handler: impl Handler) -> &mut Self {
        self.register(HandlerType::Projection, handler)
    }

    fn register(&mut self, handler_type: HandlerType, handler: impl Handler) -> &mut Self {
        let mut configurer = HandlerConfigurer::new(handler_type);
        handler.configure(&mut configurer);
        match configurer.finish() {
            Ok(config) => self.entries.push((config, Box::new(handler))),
            Err(mut errors) => self.errors.append(&mut errors),
        }
        self
    }
}

/// Collects the identity and routes of a single handler.
pub struct HandlerConfigurer {
    handler_type: HandlerType,
    identity: Option<HandlerIdentity>,
    routes: Vec<Route>,
    errors: Vec<String>,
}

impl HandlerConfigurer {
    fn new(handler_type: HandlerType) -> Self {
        Self {
            handler_type,
            identity: None,
            routes: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn identity(&mut self, name: &str) -> &mut Self {
        self.identity = Some(HandlerIdentity::new(name));
        self
    }

    pub fn handles_command<M: Message>(&mut self) -> &mut Self {
        self.route::<M>(MessageKind::Command, Direction::Inbound)
    }

    pub fn handles_event<M: Message>(&mut self) -> &mut Self {
        self.route::<M>(MessageKind::Event, Direction::Inbound)
    }

    pub fn records_event<M: Message>(&mut self) -> &mut Self {
        self.route::<M>(MessageKind::Event, Direction::Outbound)
    }

    pub fn executes_command<M: Message>(&mut self) -> &mut Self {
        self.route::<M>(MessageKind::Command, Direction::Outbound)
    }

    /// Declares that the handler schedules timeouts of type `M`. Scheduled
    /// timeouts are always delivered back to the handler that scheduled them.
    pub fn schedules_timeout<M: Message>(&mut self) -> &mut Self {
        self.route::<M>(MessageKind::Timeout, Direction::Outbound)
            .route::<M>(MessageKind::Timeout, Direction::Inbound)
    }

    fn route<M: Message>(&mut self, kind: MessageKind, direction: Direction) -> &mut Self {
        let permitted = match direction {
            Direction::Inbound => self.handler_type.can_consume(kind),
            Direction::Outbound => self.handler_type.can_produce(kind),
        };
        if !permitted {
            let verb = match direction {
                Direction::Inbound => "handle",
                Direction::Outbound => "produce",
            };
            self.errors.push(format!(
                "{} handlers can not {verb} {kind}s ('{}')",
                self.handler_type,
                M::message_type()
            ));
            return self;
        }
        let route = Route {
            message_type: M::message_type(),
            kind,
            direction,
        };
        if !self.routes.contains(&route) {
            self.routes.push(route);
        }
        self
    }

    fn finish(self) -> std::result::Result<HandlerConfig, Vec<String>> {
        let mut errors = self.errors;
        let Some(identity) = self.identity else {
            errors.push(format!("{} handler has no identity", self.handler_type));
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors.into_iter().map(|e| format!("'{identity}': {e}")).collect());
        }
        Ok(HandlerConfig {
            identity,
            handler_type: self.handler_type,
            routes: self.routes,
        })
    }
}

/// Static configuration of a single handler.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    identity: HandlerIdentity,
    handler_type: HandlerType,
    routes: Vec<Route>,
}

impl HandlerConfig {
    pub fn identity(&self) -> &HandlerIdentity {
        &self.identity
    }

    pub fn handler_type(&self) -> HandlerType {
        self.handler_type
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn has_route(&self, message_type: &MessageType, kind: MessageKind, direction: Direction) -> bool {
        self.routes
            .iter()
            .any(|r| &r.message_type == message_type && r.kind == kind && r.direction == direction)
    }

    /// Whether the handler consumes messages of the given type.
    pub fn consumes(&self, message_type: &MessageType) -> bool {
        self.routes
            .iter()
            .any(|r| r.direction == Direction::Inbound && &r.message_type == message_type)
    }

    /// Whether the handler declares at least one outbound route of the given kind.
    pub fn produces_kind(&self, kind: MessageKind) -> bool {
        self.routes
            .iter()
            .any(|r| r.direction == Direction::Outbound && r.kind == kind)
    }
}

/// Static configuration of the whole application.
#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    identity: String,
    handlers: Vec<HandlerConfig>,
    kinds: HashMap<MessageType, MessageKind>,
    produced: HashSet<MessageType>,
}

impl ApplicationConfig {
    /// Configures `app`, returning its static configuration together with the
    /// handler instances, in registration order.
    pub(crate) fn build(app: &dyn Application) -> Result<(Self, Vec<Box<dyn Handler>>)> {
        let mut configurer = ApplicationConfigurer::new();
        app.configure(&mut configurer);

        let mut errors = configurer.errors;
        let identity = configurer.identity.unwrap_or_else(|| {
            errors.push("application has no identity".to_owned());
            String::new()
        });

        let mut names = HashSet::new();
        let mut kinds: HashMap<MessageType, MessageKind> = HashMap::new();
        let mut produced = HashSet::new();
        for (config, _) in &configurer.entries {
            if !names.insert(config.identity.clone()) {
                errors.push(format!("handler name '{}' is used more than once", config.identity));
            }
            for route in &config.routes {
                match kinds.get(&route.message_type) {
                    Some(kind) if *kind != route.kind => errors.push(format!(
                        "'{}' is used as both {} and {}",
                        route.message_type,
                        kind.indefinite(),
                        route.kind.indefinite()
                    )),
                    Some(_) => {}
                    None => {
                        kinds.insert(route.message_type.clone(), route.kind);
                    }
                }
                if route.direction == Direction::Outbound {
                    produced.insert(route.message_type.clone());
                }
            }
        }

        if !errors.is_empty() {
            return Err(Error::configuration(errors.join("; ")));
        }

        let (handlers, instances): (Vec<_>, Vec<_>) = configurer.entries.into_iter().unzip();
        Ok((
            Self {
                identity,
                handlers,
                kinds,
                produced,
            },
            instances,
        ))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn handlers(&self) -> &[HandlerConfig] {
        &self.handlers
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerConfig> {
        self.handlers.iter().find(|h| h.identity.as_str() == name)
    }

    /// The kind the application uses messages of this type as.
    pub fn kind_of(&self, message_type: &MessageType) -> Option<MessageKind> {
        self.kinds.get(message_type).copied()
    }

    /// Whether any handler produces messages of this type.
    pub fn is_produced(&self, message_type: &MessageType) -> bool {
        self.produced.contains(message_type)
    }

    pub fn message_types(&self) -> impl Iterator<Item = (&MessageType, MessageKind)> {
        self.kinds.iter().map(|(t, k)| (t, *k))
    }

    /// The type used by the application that is closest to `message_type`
    /// through pointer indirection, if any.
    pub fn closest_type(&self, message_type: &MessageType) -> Option<&MessageType> {
        self.kinds
            .keys()
            .map(|t| (type_distance(message_type, t), t))
            .filter(|(d, _)| *d != TypeDistance::Unrelated)
            .min_by(|(a, x), (b, y)| a.cmp(b).then_with(|| x.name().cmp(y.name())))
            .map(|(_, t)| t)
    }

    /// Whether the application has an enabled-or-not handler of the given
    /// type capable of producing `kind`.
    pub(crate) fn has_producer_of_type(&self, handler_type: HandlerType, kind: MessageKind) -> bool {
        self.handlers
            .iter()
            .any(|h| h.handler_type == handler_type && h.produces_kind(kind))
    }
}
