use hexwork_core::{
    behavior_for, best_path, entry_cost, generate_map, path_cost, reachable_within,
    GeneratedMap, MapGenConfig, MoveProfile, RoleBehavior, Rules, TechSet, Tile,
    TransportNetwork, Treasury, World, WorldGrid, DISCONNECTED,
};
use hexwork_protocol::{
    Hex, ImprovementKind, ResourceKind, TerrainKind, TileImprovement, TilePatch, UnitRole,
    UnitStatus,
};

fn map(seed: u64) -> GeneratedMap {
    generate_map(
        &Rules::default(),
        &MapGenConfig {
            width: 24,
            height: 18,
            seed,
            ..MapGenConfig::default()
        },
    )
}

fn land(grid: &WorldGrid) -> Vec<Hex> {
    grid.iter()
        .filter(|(_, tile)| !tile.is_water())
        .map(|(hex, _)| hex)
        .collect()
}

#[test]
fn bounded_reachability_is_the_cheap_part_of_the_full_search() {
    let rules = Rules::default();
    for seed in [1, 2, 3] {
        let map = map(seed);
        let starts: Vec<Hex> = land(&map.grid).into_iter().step_by(17).collect();
        for role in [UnitRole::Engineer, UnitRole::Miner] {
            let profile = MoveProfile::for_role(&rules, role);
            for &start in &starts {
                let full = reachable_within(&map.grid, &rules, start, profile, u32::MAX);
                assert!(!full.contains(start));
                for budget in [10, 30, 60] {
                    let bounded = reachable_within(&map.grid, &rules, start, profile, budget);
                    assert!(!bounded.contains(start));
                    for hex in bounded.hexes() {
                        let cost = bounded.cost_to(hex).unwrap();
                        assert!(cost <= budget);
                        assert_eq!(full.cost_to(hex), Some(cost), "{start} -> {hex}");
                    }
                    for hex in full.hexes() {
                        if full.cost_to(hex).unwrap() <= budget {
                            assert!(bounded.contains(hex), "{start} -> {hex} missing");
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn best_path_matches_the_cheapest_cost() {
    let rules = Rules::default();
    let map = map(5);
    let profile = MoveProfile::for_role(&rules, UnitRole::Prospector);
    let start = map.capital;
    let full = reachable_within(&map.grid, &rules, start, profile, u32::MAX);
    for target in full.hexes().into_iter().step_by(7) {
        let path = best_path(&map.grid, &rules, start, target, profile).unwrap();
        assert_eq!(path.last(), Some(&target));
        assert_eq!(
            path_cost(&map.grid, &rules, &path, profile),
            full.cost_to(target)
        );
    }
}

#[test]
fn entry_costs_favor_infrastructure() {
    let rules = Rules::default();
    let profiles = [
        MoveProfile::for_role(&rules, UnitRole::Engineer),
        MoveProfile::for_role(&rules, UnitRole::Farmer),
    ];
    for profile in profiles {
        let bare: Vec<u32> = TerrainKind::ALL
            .into_iter()
            .filter_map(|terrain| entry_cost(&Tile::new(terrain), profile, &rules))
            .collect();
        assert!(!bare.is_empty());
        let cheapest_bare = bare.iter().copied().min().unwrap();

        for terrain in TerrainKind::ALL {
            let mut tile = Tile::new(terrain);
            if terrain.is_water() {
                assert_eq!(entry_cost(&tile, profile, &rules), None);
                continue;
            }
            for kind in ImprovementKind::ALL {
                tile.improvement = Some(TileImprovement::new(kind));
                let cost = entry_cost(&tile, profile, &rules).unwrap();
                assert!(cost >= 1);
                if kind.is_infrastructure() {
                    assert!(cost < cheapest_bare, "{kind:?} on {terrain:?}");
                }
            }
        }
    }
}

fn network_grid() -> WorldGrid {
    let mut grid = WorldGrid::new(8, 4, TerrainKind::Plains);
    let put = |grid: &mut WorldGrid, hex: Hex, kind: ImprovementKind| {
        grid.set(
            hex,
            TilePatch::default().improvement(Some(TileImprovement::new(kind))),
        )
        .unwrap();
    };
    put(&mut grid, Hex::new(0, 0), ImprovementKind::Capital);
    put(&mut grid, Hex::new(1, 0), ImprovementKind::Road);
    put(&mut grid, Hex::new(2, 0), ImprovementKind::Port);
    put(&mut grid, Hex::new(5, 3), ImprovementKind::Port);
    put(&mut grid, Hex::new(6, 3), ImprovementKind::Rail);
    put(&mut grid, Hex::new(3, 2), ImprovementKind::Road);
    grid
}

#[test]
fn network_costs_sentinels_and_ports() {
    let grid = network_grid();
    let mut network = TransportNetwork::new();
    assert!(network.update(&grid));

    let cost = |hex: Hex| network.costs()[grid.index_of(hex).unwrap()];
    assert_eq!(cost(Hex::new(0, 0)), 0);
    assert_eq!(network.capital(), Some(Hex::new(0, 0)));
    assert_eq!(cost(Hex::new(1, 0)), 1);
    let first_port = cost(Hex::new(2, 0));
    assert_eq!(first_port, 2);
    assert!(cost(Hex::new(5, 3)) <= first_port + 1);
    assert!(network.is_connected(&grid, Hex::new(6, 3)));

    assert_eq!(cost(Hex::new(3, 2)), DISCONNECTED);
    assert_eq!(cost(Hex::new(4, 0)), DISCONNECTED);
    assert_eq!(network.cost_from_capital(&grid, Hex::new(3, 2)), None);
    assert_eq!(network.connected_count(), 5);
}

#[test]
fn recalculation_is_idempotent() {
    let grid = network_grid();
    let mut network = TransportNetwork::new();
    network.update(&grid);
    network.mark_dirty();
    assert!(network.update(&grid));
    let first = network.costs().to_vec();
    assert!(!network.update(&grid));
    assert_eq!(network.costs(), first.as_slice());

    network.mark_dirty();
    network.update(&grid);
    assert_eq!(network.costs(), first.as_slice());
}

fn rich_world(map: GeneratedMap) -> World {
    let mut treasury = Treasury::new(1_000_000);
    for resource in ResourceKind::ALL {
        treasury.add_stock(resource, 10_000);
    }
    let techs: TechSet = ["forestry", "oil_drilling", "vulcanization"]
        .into_iter()
        .collect();
    World::new(map.grid, Rules::default(), map.player)
        .with_treasury(treasury)
        .with_techs(techs)
}

#[test]
fn every_role_reaches_a_fixed_point() {
    for role in UnitRole::ALL {
        let generated = generate_map(
            &Rules::default(),
            &MapGenConfig {
                width: 16,
                height: 12,
                seed: 11,
                territory_radius: 4,
                hidden_ratio: 0.0,
                ..MapGenConfig::default()
            },
        );
        let capital = generated.capital;
        let mut world = rich_world(generated);
        let id = world.recruit(role, capital).unwrap();
        world.set_automation(id, true).unwrap();

        let mut last = None;
        for _ in 0..500 {
            world.begin_turn();
            let report = world.take_automated_turn(id).unwrap();
            last = report.last_status().cloned();
            if !world.unit(id).unwrap().automated {
                break;
            }
        }
        let unit = world.unit(id).unwrap().clone();
        assert!(!unit.automated, "{role:?} still busy after 500 turns");
        assert!(
            matches!(
                last,
                Some(UnitStatus::NoTargets) | Some(UnitStatus::AutomationDisabled)
            ),
            "{role:?} ended with {last:?}"
        );
        if role != UnitRole::Prospector {
            assert_eq!(behavior_for(role).select_target(&world, id, &unit), None);
        }
    }
}
