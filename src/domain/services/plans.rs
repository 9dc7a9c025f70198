use serde::Serialize;
use crate::domain::models::user::{Quota, Role};

pub const BASIC_GENERATIONS: u32 = 3;
pub const STANDARD_GENERATIONS: u32 = 20;

/// Generation allowance granted whenever a user lands on `role`.
pub fn quota_for_role(role: Role) -> Quota {
    match role {
        Role::Basic => Quota::Limited(BASIC_GENERATIONS),
        Role::Standard => Quota::Limited(STANDARD_GENERATIONS),
        Role::Pro | Role::Collaborator | Role::Administrator => Quota::Unlimited,
    }
}

#[derive(Debug, Serialize)]
pub struct Plan {
    pub role: Role,
    pub title: &'static str,
    pub price: &'static str,
    pub description: &'static str,
    pub features: Vec<&'static str>,
    pub generations: Quota,
}

pub fn plan_catalog() -> Vec<Plan> {
    vec![
        Plan {
            role: Role::Basic,
            title: "Nivel Básico",
            price: "Gratis",
            description: "Ideal para empezar y para tareas ocasionales.",
            features: vec!["3 Generaciones IA", "Generación por texto", "Acceso a guías públicas"],
            generations: quota_for_role(Role::Basic),
        },
        Plan {
            role: Role::Standard,
            title: "Estándar",
            price: "1€/mes",
            description: "Para usuarios regulares que necesitan más potencia.",
            features: vec!["20 Generaciones IA/mes", "Historial de tareas"],
            generations: quota_for_role(Role::Standard),
        },
        Plan {
            role: Role::Pro,
            title: "Nivel Pro",
            price: "5€/mes",
            description: "Potencia ilimitada para usuarios frecuentes y profesionales.",
            features: vec!["Generaciones IA ilimitadas", "Análisis con imagen", "Soporte prioritario"],
            generations: quota_for_role(Role::Pro),
        },
        Plan {
            role: Role::Collaborator,
            title: "Colaborador",
            price: "10€/mes",
            description: "Aporta tu experiencia y ayuda a otros.",
            features: vec!["Publica guías con vídeo/imagen", "Generaciones IA ilimitadas", "Análisis con imagen"],
            generations: quota_for_role(Role::Collaborator),
        },
    ]
}
