//! Connections between shape connectors.

use crate::collections::ShapeCollection;
use crate::entity::{ConnectionId, End, Entity, EntityId, ShapeId, SiteId};
use crate::geometry::{DiagramPoint, point_to_segment_dist};
use crate::render::{ENDPOINT_MARKER_RADIUS, LINE_WIDTH, PaintContext};
use uuid::Uuid;

/// Where an endpoint is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attachment {
    pub shape: ShapeId,
    /// Index into the shape's connector list.
    pub index: usize,
}

/// One end of a connection.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub(crate) id: EntityId,
    /// Free-floating position, used while the endpoint is not attached.
    pub point: DiagramPoint,
    attachment: Option<Attachment>,
    selected: bool,
    hovered: bool,
    site: Option<SiteId>,
}

impl Endpoint {
    pub fn new(point: DiagramPoint) -> Self {
        Self::with_id(Uuid::new_v4(), point)
    }

    pub(crate) fn with_id(id: EntityId, point: DiagramPoint) -> Self {
        Self {
            id,
            point,
            attachment: None,
            selected: false,
            hovered: false,
            site: None,
        }
    }

    pub fn attachment(&self) -> Option<Attachment> {
        self.attachment
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub(crate) fn attach(&mut self, attachment: Attachment, point: DiagramPoint) {
        self.attachment = Some(attachment);
        self.point = point;
    }

    /// Detach, leaving the endpoint floating where it was.
    pub(crate) fn detach(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    /// Current position: the attached connector's position if it still
    /// resolves, otherwise the free-floating point.
    pub fn resolve(&self, shapes: &ShapeCollection) -> DiagramPoint {
        self.attachment
            .and_then(|a| shapes.get(a.shape)?.connector_point(a.index))
            .unwrap_or(self.point)
    }

    /// Check if a world point lies within `radius` of this endpoint.
    pub fn hit(&self, point: DiagramPoint, shapes: &ShapeCollection, radius: f64) -> bool {
        self.resolve(shapes).distance(point) <= radius
    }
}

impl Entity for Endpoint {
    fn id(&self) -> EntityId {
        self.id
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn is_hovered(&self) -> bool {
        self.hovered
    }

    fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    fn site(&self) -> Option<SiteId> {
        self.site
    }

    fn set_site(&mut self, site: Option<SiteId>) {
        self.site = site;
    }

    /// Attached endpoints follow their connector; only free ones move.
    fn translate(&mut self, dx: i32, dy: i32) {
        if self.attachment.is_none() {
            self.point = self.point.translate(dx, dy);
        }
    }

    fn paint(&self, ctx: &mut PaintContext<'_>) {
        let center = ctx.to_screen(self.resolve(ctx.shapes));
        let color = ctx.palette.pick(self.selected, self.hovered);
        ctx.surface.dot(center, ENDPOINT_MARKER_RADIUS, color);
    }
}

/// A line wired between two endpoints.
#[derive(Debug, Clone)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    pub from: Endpoint,
    pub to: Endpoint,
    selected: bool,
    hovered: bool,
    site: Option<SiteId>,
}

impl Connection {
    /// Create a connection between two free points.
    pub fn new(from: DiagramPoint, to: DiagramPoint) -> Self {
        Self::with_ids(Uuid::new_v4(), Endpoint::new(from), Endpoint::new(to))
    }

    pub(crate) fn with_ids(id: ConnectionId, from: Endpoint, to: Endpoint) -> Self {
        Self {
            id,
            from,
            to,
            selected: false,
            hovered: false,
            site: None,
        }
    }

    pub fn endpoint(&self, end: End) -> &Endpoint {
        match end {
            End::From => &self.from,
            End::To => &self.to,
        }
    }

    pub fn endpoint_mut(&mut self, end: End) -> &mut Endpoint {
        match end {
            End::From => &mut self.from,
            End::To => &mut self.to,
        }
    }

    /// Both endpoints are anchored to a connector.
    pub fn is_fully_attached(&self) -> bool {
        self.from.is_attached() && self.to.is_attached()
    }

    /// Whether either endpoint is anchored to `shape`.
    pub fn touches_shape(&self, shape: ShapeId) -> bool {
        [&self.from, &self.to]
            .iter()
            .any(|e| e.attachment().is_some_and(|a| a.shape == shape))
    }

    /// Resolved (from, to) positions.
    pub fn resolve(&self, shapes: &ShapeCollection) -> (DiagramPoint, DiagramPoint) {
        (self.from.resolve(shapes), self.to.resolve(shapes))
    }

    /// Check if a world point lies on the line.
    ///
    /// The neighbourhoods of both endpoints (`endpoint_radius`) are excluded,
    /// so a press near either end reaches the endpoint instead of the line.
    pub fn hit_line(
        &self,
        point: DiagramPoint,
        shapes: &ShapeCollection,
        line_radius: f64,
        endpoint_radius: f64,
    ) -> bool {
        let (from, to) = self.resolve(shapes);
        if from.distance(point) <= endpoint_radius || to.distance(point) <= endpoint_radius {
            return false;
        }
        point_to_segment_dist(point.to_kurbo(), from.to_kurbo(), to.to_kurbo()) <= line_radius
    }
}

impl Entity for Connection {
    fn id(&self) -> EntityId {
        self.id
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn is_hovered(&self) -> bool {
        self.hovered
    }

    fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    fn site(&self) -> Option<SiteId> {
        self.site
    }

    fn set_site(&mut self, site: Option<SiteId>) {
        self.site = site;
        self.from.set_site(site);
        self.to.set_site(site);
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.from.translate(dx, dy);
        self.to.translate(dx, dy);
    }

    /// Draws the line only; endpoints are painted separately.
    fn paint(&self, ctx: &mut PaintContext<'_>) {
        let (from, to) = self.resolve(ctx.shapes);
        let color = ctx.palette.pick(self.selected, self.hovered);
        let (from, to) = (ctx.to_screen(from), ctx.to_screen(to));
        ctx.surface.line(from, to, color, LINE_WIDTH);
    }
}
