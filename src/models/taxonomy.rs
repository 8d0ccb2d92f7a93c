use std::fmt;
use std::str::FromStr;

macro_rules! labeled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labeled_enum! {
    Country {
        Argentina => "Argentina",
        Bolivia => "Bolivia",
        Brasil => "Brasil",
        Paraguay => "Paraguay",
        Uruguay => "Uruguay",
    }
}

labeled_enum! {
    Sector {
        Infraestructura => "Infraestructura",
        SocioAmbiental => "SocioAmbiental",
        Productivo => "Productivo",
    }
}

labeled_enum! {
    Subsector {
        Construccion => "Construcción",
        Transporte => "Transporte",
        Energia => "Energía",
        ObrasPublicas => "Obras Públicas",
        Sostenibilidad => "Sostenibilidad",
        RecursosNaturales => "Recursos Naturales",
        GestionAmbiental => "Gestión Ambiental",
        Industria => "Industria",
        Comercio => "Comercio",
        Agricultura => "Agricultura",
        Turismo => "Turismo",
    }
}

labeled_enum! {
    /// Objetivos de Desarrollo Sostenible, in goal order (1..=17).
    Ods {
        FinDeLaPobreza => "Fin de la Pobreza",
        HambreCero => "Hambre Cero",
        SaludYBienestar => "Salud y Bienestar",
        EducacionDeCalidad => "Educación de Calidad",
        IgualdadDeGenero => "Igualdad de Género",
        AguaLimpiaYSaneamiento => "Agua Limpia y Saneamiento",
        EnergiaAsequible => "Energía Asequible y No Contaminante",
        TrabajoDecente => "Trabajo Decente y Crecimiento Económico",
        IndustriaInnovacion => "Industria, Innovación e Infraestructura",
        ReduccionDeDesigualdades => "Reducción de Desigualdades",
        CiudadesSostenibles => "Ciudades y Comunidades Sostenibles",
        ProduccionResponsable => "Producción y Consumo Responsables",
        AccionPorElClima => "Acción por el Clima",
        VidaSubmarina => "Vida Submarina",
        VidaDeEcosistemas => "Vida de Ecosistemas Terrestres",
        PazJusticia => "Paz, Justicia e Instituciones Sólidas",
        Alianzas => "Alianzas para Lograr los Objetivos",
    }
}

impl Sector {
    pub fn subsectors(self) -> &'static [Subsector] {
        match self {
            Sector::Infraestructura => &[
                Subsector::Construccion,
                Subsector::Transporte,
                Subsector::Energia,
                Subsector::ObrasPublicas,
            ],
            Sector::SocioAmbiental => &[
                Subsector::Sostenibilidad,
                Subsector::RecursosNaturales,
                Subsector::GestionAmbiental,
            ],
            Sector::Productivo => &[
                Subsector::Industria,
                Subsector::Comercio,
                Subsector::Agricultura,
                Subsector::Turismo,
            ],
        }
    }
}

impl Subsector {
    pub fn sector(self) -> Sector {
        match self {
            Subsector::Construccion
            | Subsector::Transporte
            | Subsector::Energia
            | Subsector::ObrasPublicas => Sector::Infraestructura,
            Subsector::Sostenibilidad | Subsector::RecursosNaturales | Subsector::GestionAmbiental => {
                Sector::SocioAmbiental
            }
            Subsector::Industria | Subsector::Comercio | Subsector::Agricultura | Subsector::Turismo => {
                Sector::Productivo
            }
        }
    }
}

impl Ods {
    /// Goals are numbered 1..=17 in declaration order.
    pub fn from_number(number: u8) -> Option<Ods> {
        let idx = usize::from(number).checked_sub(1)?;
        Ods::ALL.get(idx).copied()
    }

    /// Joins the labels with ", " in the given order, the way the sheet stores them.
    pub fn join(selection: &[Ods]) -> String {
        selection
            .iter()
            .map(|o| o.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lowercases and strips Spanish accents so "energia" matches "Energía".
pub fn fold(input: &str) -> String {
    input
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

fn parse_label<T: Copy>(
    all: &[T],
    label: fn(T) -> &'static str,
    input: &str,
    what: &str,
) -> Result<T, String> {
    let wanted = fold(input);
    all.iter()
        .copied()
        .find(|&v| fold(label(v)) == wanted)
        .ok_or_else(|| {
            let options: Vec<&str> = all.iter().map(|&v| label(v)).collect();
            format!(
                "{} inválido '{}'. Opciones: {}",
                what,
                input.trim(),
                options.join(" | ")
            )
        })
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(Country::ALL, Country::label, s, "País")
    }
}

impl FromStr for Sector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(Sector::ALL, Sector::label, s, "Sector")
    }
}

impl FromStr for Subsector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(Subsector::ALL, Subsector::label, s, "Subsector")
    }
}

impl FromStr for Ods {
    type Err = String;

    /// Accepts the goal number (1-17) or its label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = s.trim().parse::<u8>() {
            return Ods::from_number(number)
                .ok_or_else(|| format!("Número de ODS inválido {}. Use 1 a 17.", number));
        }
        parse_label(Ods::ALL, Ods::label, s, "ODS")
    }
}
