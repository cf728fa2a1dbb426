//! Dialogue copy, button sets and menu taxonomies.

use crate::chatbot::profile::Role;

pub const ASK_FULL_NAME: &str = "¿Sería tan amable de darme su nombre y apellido?";
pub const ASK_BIRTHDATE: &str = "¿Sería tan amable de indicarme su fecha de nacimiento?";
pub const ASK_EMAIL: &str = "Y ahora tu correo electrónico.";
pub const ASK_CONTACT_EMAIL: &str = "Proporciona un correo electrónico para contactarte";
pub const ASK_SEX: &str = "Por último, selecciona tu género:";
pub const ASK_ADD_DEPENDENT: &str = "¿Desea agregar a un familiar a la cotización?";
pub const ASK_ADD_ANOTHER: &str = "¿Desea agregar a otro familiar a la cotización?";
pub const ASK_RELATIONSHIP: &str =
    "Escribe el parentesco (Madre, Padre, Esposo, Esposa, Hijo, Hija, Hermano o Hermana):";
pub const NO_MORE_DEPENDENTS: &str =
    "Ha elegido no agregar más familiares. Procederé a preparar su cotización.";

pub const INVALID_DATE: &str =
    "La fecha no es correcta, por favor ingresa una fecha valida (DD/MM/AAAA).";
pub const INVALID_EMAIL: &str =
    "El correo electrónico ingresado no es válido. Por favor, ingresa un correo electrónico válido.";
pub const INVALID_RELATIONSHIP: &str = "El parentesco no es correcto. Por favor, escribe alguna de estas opciones: Madre, Padre, Esposo, Esposa, Hijo, Hija, Hermano o Hermana";

pub const QUOTE_STATUS: &str = "Perfecto, en este momento le estoy enviando un cuadro de cotización para que proceda con su revisión.";
pub const QUOTE_ALTERNATIVES: &str =
    "Por otro lado, le estoy enviando otras cotizaciones que puedan adaptarse a su presupuesto";
pub const QUOTE_FAILED: &str = "Hubo un error al procesar tu cotización.";
pub const QUOTE_DONE: &str =
    "Tu cotización ha sido procesada con éxito. ¿Tienes alguna otra pregunta para mí?";
pub const ANYTHING_ELSE: &str = "¿Tienes alguna otra pregunta para mí?";
pub const ANOTHER_QUESTION: &str = "¿Tienes otra pregunta?";
pub const BENEFICIARY_FAILED: &str =
    "No pude registrar a tu familiar en este momento, nuestro equipo lo revisará.";
pub const ASSIGNMENT_FAILED: &str =
    "No pude asignar tu solicitud a un analista en este momento.";

pub const ASSISTANT_READY: &str = "Estoy aqui para responder tus preguntas. Adelante.";
pub const ASSISTANT_FAILED: &str = "Hubo un problema al procesar tu pregunta.";
pub const WRITE_QUESTION: &str = "Por favor, escribe tu pregunta a continuación.";
pub const GANDALF_READY: &str = "Pregúntame lo que quieras. Soy *Gandalf el Blanco*.";
pub const NEXT_QUESTION: &str = "¡Muy bien! Haz tu próxima pregunta.";
pub const QUOTE_AGAIN: &str = "¡Bien! Vamos a cotizar de nuevo...";
pub const CAN_QUOTE_AGAIN: &str = "¡Seguro! Podemos volver a cotizar.";

pub const ASK_AREA: &str = "¿En qué área te puedo ayudar?";
pub const ASK_SUBAREA: &str = "¿En qué subárea te puedo ayudar?";
pub const ASK_ROLE: &str = "¿Con que rol quieres interactuar conmigo?";
pub const PICK_SUBCATEGORY: &str = "Selecciona una subcategoría:";
pub const PICK_INSURER: &str = "Selecciona una aseguradora:";
pub const PICK_DOCUMENT: &str = "Selecciona un archivo o carpeta:";
pub const DOCUMENT_CAPTION: &str = "Aquí está el documento que solicitaste";
pub const INVALID_OPTION: &str = "Opción no válida. Selecciona una opción válida.";
pub const UNKNOWN_SUBCATEGORY: &str = "Subcategoría no reconocida. Elige una opción válida.";
pub const EMPTY_FOLDER: &str = "Documento no válido o carpeta vacia. Intente de nuevo.";

pub const TRAINER_PROMPT: &str =
    "¡Hola Maestro! ¿Que nueva instrucción o sugerencia quieres que aprenda?";
pub const TRAINER_WORKING: &str = "Memorizando. Espera un momento por favor...";
pub const TRAINER_DONE: &str = "Mi base de conocimiento ha sido actualizada con éxito.";
pub const TRAINER_MISSING: &str =
    "Mi base de conocimiento no tiene instrucciones. Algo anda mal con mi servidor.";

pub const NOT_UNDERSTOOD: &str = "No entiendo tu mensaje. Escribe *hola* para empezar de nuevo.";

/// Assistant replies that steer the conversation instead of being shown.
pub const TOKEN_START: &str = "TOKEN_START";
pub const TOKEN_END: &str = "TOKEN_END";

pub fn welcome(bot: &str, company: &str) -> String {
    format!(
        "Hola, espero te encuentres bien. Soy *{bot}*, ejecutivo virtual de *{company}*. Es un gusto para mí atenderte para ofrecerte diferentes opciones de seguros de salud."
    )
}

pub fn greet_named(name: &str, bot: &str, company: &str) -> String {
    format!("Hola *{name}*, espero te encuentres bien. Soy *{bot}*, ejecutivo virtual de *{company}*.")
}

pub fn greet_developer(name: &str, developer_bot: &str) -> String {
    format!("Hola *{name}*, soy *{developer_bot}*, pregúntame lo que quieras")
}

pub fn nice_to_meet(name: &str) -> String {
    format!("Un gusto *{name}*. También indícame tu fecha de nacimiento:")
}

pub fn ask_dependent_birthdate(relationship: &str) -> String {
    format!("Escribe la fecha de nacimiento de tu {relationship}:")
}

pub fn quote_ready(quotation_id: &str) -> String {
    format!("Tu cotización {quotation_id} ya está lista. Puedes verla aquí.")
}

pub fn analyst_handoff(name: &str, policy: &str) -> String {
    format!(
        "Gracias {name}, voy a dirigir tu llamada a un analista para una póliza de {policy}. ¿Tienes alguna otra pregunta para mí?"
    )
}

pub fn farewell(role: Role) -> &'static str {
    if role.is_staff() {
        "¡Gracias por contactarme! Si necesitas más ayuda en el futuro, no dudes en escribirme."
    } else {
        "¡Gracias por contactarnos! Si necesitas más ayuda en el futuro, no dudes en escribirnos."
    }
}

pub fn restart_invite(role: Role) -> &'static str {
    if role.is_staff() {
        "¡Seguro! Solo escribeme *Hola* otra vez cuando quieras volver a consultar.."
    } else {
        "¡Seguro! Solo escribeme *Hola* otra vez cuando quieras volver a cotizar.."
    }
}

pub const YES_NO: [(&str, &str); 2] = [("Si", "Si"), ("No", "No")];
pub const SEX: [(&str, &str); 2] = [("M", "Masculino"), ("F", "Femenino")];
pub const CONTINUE: [(&str, &str); 1] = [("Continuar", "Continuar")];

/// Si / No / back-to-quoting buttons; staff see the shorter label.
pub fn follow_up_buttons(role: Role) -> [(&'static str, &'static str); 3] {
    let back = if role.is_staff() { "Volver" } else { "Volver a cotizar" };
    [("Si", "Si"), ("No", "No"), ("Cotiza", back)]
}

/// Inputs that mean "start a new quote" at the follow-up steps.
pub fn is_restart_request(input: &str) -> bool {
    matches!(input, "volver a cotizar" | "volver" | "cotiza")
}

/// Option that hands an associate over to the assistant.
pub fn talk_to_bot(bot: &str) -> String {
    format!("Hablar con {bot}")
}

pub fn area_options(bot: &str) -> Vec<String> {
    vec![
        "Riesgos".to_string(),
        "Soporte al Cliente".to_string(),
        "Administracion".to_string(),
        talk_to_bot(bot),
    ]
}

pub fn role_options(developer_enabled: bool) -> Vec<String> {
    let mut options = vec!["Usuario".to_string(), "Asociado".to_string(), "Master".to_string()];
    if developer_enabled {
        options.push("Desarrollador".to_string());
    }
    options
}

/// Subcategory menu for a case-folded area name.
pub fn subcategories(category: &str) -> Option<&'static [&'static str]> {
    match category {
        "administracion" => Some(&["Aranceles", "Relacion Comisiones", "Pago Comisiones", "Contacto"]),
        "riesgos" => Some(&[
            "Condicionados",
            "Métodos Pago",
            "Requisitos Cotizar",
            "Requisitos Emitir",
            "Requ. cotizar colectivo",
            "Requ. cotizar flota",
            "Solicitudes",
            "Edad de admisibilidad",
            "Plazos de espera",
        ]),
        "soporte al cliente" => Some(&["Red clinicas", "Proc. Reclamos", "Tramitar Recl.", "Contactos Emerg."]),
        _ => None,
    }
}

/// Subcategories whose documents are filed per insurer.
pub fn has_insurer_menu(subcategory: &str) -> bool {
    matches!(
        subcategory,
        "condicionados" | "métodos pago" | "solicitudes" | "red clinicas"
    )
}
