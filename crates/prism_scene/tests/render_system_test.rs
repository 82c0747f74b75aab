//! # Render System Integration Test
//!
//! Drives the render system through the coordinator the way an application
//! would: bootstrap, populate, mutate, tear down.

use prism_core::{Coordinator, EcsConfig, Entity};
use prism_scene::{
    instance_bytes, InstanceData, MaterialHandle, MeshHandle, MeshRenderer, Name, RenderSystem,
    Transform,
};

fn renderer(mesh: u32, material: u32) -> MeshRenderer {
    MeshRenderer::new(MeshHandle(mesh), MaterialHandle(material))
}

fn spawn(ecs: &mut Coordinator, x: f32, mesh: u32, material: u32) -> Entity {
    let entity = ecs.create_entity().unwrap();
    ecs.add_component(entity, Transform::from_translation([x, 0.0, 0.0]))
        .unwrap();
    ecs.add_component(entity, renderer(mesh, material)).unwrap();
    entity
}

/// Test: joining the system is the only way to get a slot.
#[test]
fn test_slot_follows_membership() {
    let mut ecs = Coordinator::default();
    let render = RenderSystem::install(&mut ecs).unwrap();

    let entity = ecs.create_entity().unwrap();
    ecs.add_component(entity, Transform::default()).unwrap();
    assert_eq!(render.slot_of(entity), None);

    ecs.add_component(entity, renderer(0, 0)).unwrap();
    assert_eq!(render.slot_of(entity), Some(0));

    ecs.remove_component::<Transform>(entity).unwrap();
    assert_eq!(render.slot_of(entity), None);
    assert_eq!(render.cached_entities(), 0);
}

/// Test: destroying a member releases its slot for the next member.
#[test]
fn test_destroy_releases_slot() {
    let mut ecs = Coordinator::default();
    let render = RenderSystem::install(&mut ecs).unwrap();

    let a = spawn(&mut ecs, 0.0, 0, 0);
    let b = spawn(&mut ecs, 1.0, 0, 0);
    assert_eq!((render.slot_of(a), render.slot_of(b)), (Some(0), Some(1)));

    ecs.destroy_entity(a).unwrap();
    assert_eq!(render.slot_of(a), None);

    let c = spawn(&mut ecs, 2.0, 0, 0);
    assert_eq!(render.slot_of(c), Some(0));
    assert_eq!(render.slot_high_water(), 2);

    let stats = render.lifecycle();
    assert_eq!((stats.created, stats.deleted), (3, 1));
}

/// Test: draw lists skip hidden renderers and sort by material then mesh.
#[test]
fn test_draw_list_order_and_visibility() {
    let mut ecs = Coordinator::default();
    let render = RenderSystem::install(&mut ecs).unwrap();

    let a = spawn(&mut ecs, 1.0, 2, 1);
    let b = spawn(&mut ecs, 2.0, 1, 1);
    let c = spawn(&mut ecs, 3.0, 5, 0);
    let hidden = spawn(&mut ecs, 4.0, 0, 0);
    ecs.get_component_mut::<MeshRenderer>(hidden).unwrap().visible = false;

    let draws = render.build_draw_list(&ecs).unwrap();
    let order: Vec<Entity> = draws.iter().map(|draw| draw.entity).collect();
    assert_eq!(order, vec![c, b, a]);

    // The hidden entity keeps its slot.
    assert!(render.slot_of(hidden).is_some());

    let bytes = instance_bytes(&draws);
    assert_eq!(bytes.len(), 3 * InstanceData::SIZE);
    let first: InstanceData = bytemuck::pod_read_unaligned(&bytes[..InstanceData::SIZE]);
    assert!((first.model[12] - 3.0).abs() < f32::EPSILON);
}

/// Test: transforms edited in place show up in the next draw list.
#[test]
fn test_draw_list_reads_current_transforms() {
    let mut ecs = Coordinator::default();
    let render = RenderSystem::install(&mut ecs).unwrap();
    let entity = spawn(&mut ecs, 0.0, 0, 0);

    ecs.get_component_mut::<Transform>(entity)
        .unwrap()
        .translate([0.0, 5.0, 0.0]);

    let draws = render.build_draw_list(&ecs).unwrap();
    assert!((draws[0].instance.model[13] - 5.0).abs() < f32::EPSILON);
}

/// Test: swap-and-pop in one array never shuffles another entity's draw.
#[test]
fn test_compaction_keeps_draws_attached_to_their_entities() {
    let mut ecs = Coordinator::default();
    let render = RenderSystem::install(&mut ecs).unwrap();
    ecs.register_component::<Name>().unwrap();

    let entities: Vec<Entity> = (0..5)
        .map(|i| {
            let entity = spawn(&mut ecs, i as f32, 0, 0);
            ecs.add_component(entity, Name(format!("e{i}"))).unwrap();
            entity
        })
        .collect();

    ecs.destroy_entity(entities[1]).unwrap();

    for draw in render.build_draw_list(&ecs).unwrap() {
        let index = entities.iter().position(|&e| e == draw.entity).unwrap();
        assert!((draw.instance.model[12] - index as f32).abs() < f32::EPSILON);
        assert_eq!(ecs.get_component::<Name>(draw.entity).unwrap().0, format!("e{index}"));
        assert_eq!(render.slot_of(draw.entity), Some(draw.slot));
    }
}

/// Test: the application may register scene components before installing.
#[test]
fn test_install_after_manual_registration() {
    let mut ecs = Coordinator::new(EcsConfig {
        preallocate_components: true,
        max_entities: 128,
        ..EcsConfig::default()
    })
    .unwrap();
    let transform = ecs.register_component::<Transform>().unwrap();

    let render = RenderSystem::install(&mut ecs).unwrap();
    assert_eq!(ecs.component_family::<Transform>().unwrap(), transform);
    assert_eq!(
        ecs.system_signature::<RenderSystem>().unwrap().len(),
        2
    );
    assert_eq!(render.cached_entities(), 0);
}

/// Test: dropping the render system disconnects its callbacks.
#[test]
fn test_dropped_render_system_disconnects() {
    let mut ecs = Coordinator::default();
    let render = RenderSystem::install(&mut ecs).unwrap();
    assert_eq!(ecs.total_connected_receivers(), 1);

    drop(render);
    assert_eq!(ecs.total_connected_receivers(), 0);

    // Membership still tracks; nobody is listening.
    let entity = spawn(&mut ecs, 0.0, 0, 0);
    assert!(ecs.system_entities::<RenderSystem>().unwrap().contains(&entity));
}
